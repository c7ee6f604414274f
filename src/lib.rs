pub mod arguments;
pub mod config;
pub mod credentials;
pub mod error;
pub mod git;
pub mod parsers;
pub mod publisher;
pub mod release;
pub mod remote;
pub mod test_runner;
pub mod version;
