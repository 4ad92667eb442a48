// ABOUTME: Library crate for netcalc exposing the calculator, compute client and connection monitor

pub mod app;
pub mod calculator;
pub mod cli;
pub mod client;
pub mod components;
pub mod config;
pub mod connection;
pub mod models;
