//! Progress indicators shown while a reply is pending

pub mod reporter;
