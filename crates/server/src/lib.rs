#[cfg(feature = "server")]
pub mod auth;

#[cfg(feature = "server")]
pub mod db;

#[cfg(feature = "server")]
pub mod error_convert;

#[cfg(feature = "server")]
pub mod health;

#[cfg(feature = "server")]
pub mod openapi;

#[cfg(feature = "server")]
pub mod rate_limit;

#[cfg(feature = "server")]
pub mod repo;

#[cfg(feature = "server")]
pub mod rest;
