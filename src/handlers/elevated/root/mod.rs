// handlers/elevated/root/mod.rs - /api/root/*

pub mod tenant;
