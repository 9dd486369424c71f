// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fuzz test for wire frame decoding
//! Decoding is a total function: arbitrary input must produce a
//! command or a decode error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tacnet_network::protocol::Command;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        let _ = Command::decode(line);
    }
});
