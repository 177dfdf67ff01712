pub mod database;
pub mod jwt;
pub mod media;
pub mod redis;
pub mod site;
