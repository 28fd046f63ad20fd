// marksync services
// Services wrap external collaborators: authentication and configuration.

pub mod auth;
pub mod config;
