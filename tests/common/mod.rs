#![allow(dead_code)]

pub mod clock;
