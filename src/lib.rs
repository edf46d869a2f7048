//! Scraper for the audio section of the VK web interface.
//!
//! The site offers no public audio API. This crate drives the same
//! endpoints the web and mobile sites use: it pages through listings,
//! resolves the tracks found into playable URLs in small, paced batches,
//! and decodes the URLs where the site obfuscates them.
//!
//! Start with [`audio::VkAudio`].
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[macro_use]
extern crate log;

pub mod album;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod normalize;
pub mod protocol;
pub mod resolver;
pub mod scrape;
pub mod secrets;
pub mod session;
pub mod track;
pub mod url_decoder;
