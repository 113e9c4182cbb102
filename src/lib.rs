pub mod comment;
pub mod config;
pub mod contact;
pub mod error;
pub mod inspect;
pub mod mail;
pub mod markdown;
pub mod pages;
pub mod portfolio;
pub mod post;
pub mod review;
pub mod serve;
pub mod store;
pub mod submission;
pub mod thread;
