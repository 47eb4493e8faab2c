#![allow(dead_code)]

pub mod fake_gl;
pub mod test_utils;
