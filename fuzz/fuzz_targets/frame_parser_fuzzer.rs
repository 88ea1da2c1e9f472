//! Fuzz target for the frame grammar.
//!
//! # Invariants
//!
//! - NEVER panic on any plaintext
//! - A protected frame always carries at least one command
//! - A parsed frame's token and arguments never contain a space
//! - A frame of three or more space-separated words is always `BadCommand`

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermonet_core::{parse_frame, Frame, FrameError, OpenCommand};

fuzz_target!(|plaintext: &str| {
    let words = plaintext.trim().split(' ').count();

    match parse_frame(plaintext) {
        Ok(Frame::Protected { token, commands }) => {
            assert!(!commands.is_empty());
            assert!(!token.contains(' '));
        },
        Ok(Frame::Open(OpenCommand::Auth { digest })) => assert!(!digest.contains(' ')),
        Ok(Frame::Open(OpenCommand::Logout { token })) => assert!(!token.contains(' ')),
        Err(FrameError::BadCommand | FrameError::AuthenticateFirst) => {},
    }

    if words >= 3 {
        assert_eq!(parse_frame(plaintext), Err(FrameError::BadCommand));
    }
});
