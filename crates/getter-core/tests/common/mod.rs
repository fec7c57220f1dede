#![allow(dead_code)]

pub mod http10_server;
