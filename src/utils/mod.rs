// src/utils/mod.rs

pub mod access;
pub mod html;
pub mod jwt;
