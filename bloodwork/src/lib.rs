//! Blood sample records on top of labstore: the fixed `blood` table with its measurement units,
//! and the store operations the desktop front end calls.

pub mod sample;
pub mod store;

pub use labstore;
pub use sample::BloodSample;
pub use store::{BloodStore, LABEL_TABLE};
