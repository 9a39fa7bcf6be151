//! Integration tests for spackenv

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const SPEC: &str = "packages:\n  - zlib\n";

    /// Scratch config dir, spec file and environment root
    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let fixture = Self {
                dir: TempDir::new().unwrap(),
            };
            fs::write(fixture.spec(), SPEC).unwrap();
            fixture.write_config("spack");
            fixture
        }

        fn spec(&self) -> PathBuf {
            self.dir.path().join("zlib.yaml")
        }

        fn root(&self) -> PathBuf {
            self.dir.path().join("envs")
        }

        fn config(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        fn write_config(&self, executable: &str) {
            let content = format!(
                "[env]\nroot_dir = {:?}\n\n[tool]\nexecutable = {:?}\n",
                self.root().display().to_string(),
                executable
            );
            fs::write(self.config(), content).unwrap();
        }

        /// Install a stand-in spack script that only logs `install`
        #[cfg(unix)]
        fn fake_spack(&self) -> PathBuf {
            use std::os::unix::fs::PermissionsExt;

            let path = self.dir.path().join("spack");
            let script = "#!/bin/sh\n\
                if [ \"$1\" = install ]; then\n\
                  echo \"==> Installing zlib\"\n\
                  [ -n \"$SPACKENV_TEST_FAIL\" ] && { echo \"==> Error: build failed\"; exit 3; }\n\
                fi\n\
                exit 0\n";
            fs::write(&path, script).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            self.write_config(&path.display().to_string());
            path
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("spackenv");
            cmd.arg("--config").arg(self.config());
            cmd.env_remove("SPACKENV_CONFIG");
            cmd
        }
    }

    fn entries(dir: &Path) -> usize {
        fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("spackenv")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("ensure"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("spackenv")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("spackenv"));
    }

    #[test]
    fn hash_is_stable_and_hex() {
        let fx = Fixture::new();
        let first = fx.cmd().args(["hash"]).arg(fx.spec()).output().unwrap();
        let second = fx.cmd().args(["hash"]).arg(fx.spec()).output().unwrap();

        assert!(first.status.success());
        let hash = String::from_utf8(first.stdout.clone()).unwrap();
        let hash = hash.trim();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(first.stdout, second.stdout);
    }

    #[test]
    fn hash_depends_on_root() {
        let fx = Fixture::new();
        let default_root = fx.cmd().arg("hash").arg(fx.spec()).output().unwrap();
        let other_root = fx
            .cmd()
            .arg("hash")
            .arg(fx.spec())
            .arg("--root")
            .arg(fx.dir.path().join("elsewhere"))
            .output()
            .unwrap();
        assert_ne!(default_root.stdout, other_root.stdout);
    }

    #[test]
    fn missing_spec_file_fails() {
        let fx = Fixture::new();
        fx.cmd()
            .args(["hash", "does-not-exist.yaml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("does-not-exist.yaml"));
    }

    #[test]
    fn archive_is_unsupported() {
        let fx = Fixture::new();
        fx.cmd()
            .arg("archive")
            .arg(fx.spec())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported operation"));
    }

    #[test]
    fn dry_run_leaves_root_untouched() {
        let fx = Fixture::new();
        fx.cmd()
            .args(["ensure", "--dry-run"])
            .arg(fx.spec())
            .assert()
            .success()
            .stdout(predicate::str::contains(fx.root().display().to_string()));
        assert_eq!(entries(&fx.root()), 0);
    }

    #[test]
    fn status_reports_absent() {
        let fx = Fixture::new();
        fx.cmd()
            .args(["status", "--format", "plain"])
            .arg(fx.spec())
            .assert()
            .success()
            .stdout(predicate::str::starts_with("absent\t"));
    }

    #[test]
    fn missing_tool_is_reported() {
        let fx = Fixture::new();
        fx.write_config("spackenv-no-such-spack");
        fx.cmd()
            .arg("ensure")
            .arg(fx.spec())
            .assert()
            .failure()
            .stderr(predicate::str::contains("spackenv-no-such-spack"));
        assert_eq!(entries(&fx.root()), 0);
    }

    #[cfg(unix)]
    #[test]
    fn ensure_creates_then_reuses() {
        let fx = Fixture::new();
        fx.fake_spack();

        let first = fx.cmd().arg("ensure").arg(fx.spec()).output().unwrap();
        assert!(first.status.success(), "{:?}", first);
        let path = PathBuf::from(String::from_utf8(first.stdout.clone()).unwrap().trim());
        assert!(path.join("env_setup_start").exists());
        assert!(path.join("env_setup_done").exists());
        assert_eq!(fs::read_to_string(path.join("spack.yaml")).unwrap(), SPEC);

        let second = fx.cmd().arg("ensure").arg(fx.spec()).output().unwrap();
        assert!(second.status.success());
        assert_eq!(first.stdout, second.stdout);

        fx.cmd()
            .args(["status", "--format", "json"])
            .arg(fx.spec())
            .assert()
            .success()
            .stdout(predicate::str::contains("\"state\": \"complete\""));
    }

    #[cfg(unix)]
    #[test]
    fn failed_install_is_rolled_back() {
        let fx = Fixture::new();
        fx.fake_spack();

        fx.cmd()
            .arg("ensure")
            .arg(fx.spec())
            .env("SPACKENV_TEST_FAIL", "1")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Could not create spack environment"))
            .stderr(predicate::str::contains("build failed"));

        let hash = fx.cmd().arg("hash").arg(fx.spec()).output().unwrap();
        let hash = String::from_utf8(hash.stdout).unwrap();
        assert!(!fx.root().join(hash.trim()).exists());
    }

    #[cfg(unix)]
    #[test]
    fn broken_environment_needs_repair() {
        let fx = Fixture::new();
        fx.fake_spack();

        let hash = fx.cmd().arg("hash").arg(fx.spec()).output().unwrap();
        let hash = String::from_utf8(hash.stdout).unwrap();
        let env = fx.root().join(hash.trim());
        fs::create_dir_all(&env).unwrap();
        fs::write(env.join("env_setup_start"), "").unwrap();

        fx.cmd()
            .arg("ensure")
            .arg(fx.spec())
            .assert()
            .failure()
            .stderr(predicate::str::contains("--repair"));

        fx.cmd()
            .args(["ensure", "--repair"])
            .arg(fx.spec())
            .assert()
            .success();
        assert!(env.join("env_setup_done").exists());
    }

    #[test]
    fn activate_prints_wrapped_command() {
        let fx = Fixture::new();
        fx.cmd()
            .arg("activate")
            .arg(fx.spec())
            .args(["--", "python", "-c", "print(1)"])
            .assert()
            .success()
            .stdout(predicate::str::contains("env activate --sh"))
            .stdout(predicate::str::contains("python -c 'print(1)'"));
    }

    #[test]
    fn config_path() {
        let fx = Fixture::new();
        fx.cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let fx = Fixture::new();
        fx.cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[provision]"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let fx = Fixture::new();
        fs::write(fx.config(), "[provision]\nbroken = \"explode\"\n").unwrap();
        fx.cmd()
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("config.toml"));
    }

    #[test]
    fn completions_generate() {
        cargo_bin_cmd!("spackenv")
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("spackenv"));
    }
}
