pub mod config;
pub mod contact_client;
pub mod contact_form;
pub mod domain;
pub mod mail_dispatcher;
mod routes;
mod startup;
pub mod telemetry;
mod util;

pub use startup::run;
