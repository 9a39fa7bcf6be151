//! spackenv - content-addressed Spack environments
//!
//! Each environment specification is hashed together with the root it is
//! stored under, and provisioned at most once into `<root>/<hash>`. Later
//! requests for the same specification get the existing directory back.

pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod orchestration;
pub mod source;
pub mod ui;

pub use error::{SpackEnvError, SpackEnvResult};
