// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for the wire layer: chunking never changes what decodes.

use crate::framing::{encode_frame, FrameDecoder};
use crate::request::{decode_request, Request};
use proptest::prelude::*;

fn arb_request() -> impl Strategy<Value = Request> {
    prop_oneof![
        Just(Request::Ping),
        Just(Request::CountUnread),
        Just(Request::ListAccounts),
        ("[a-z]{1,8}", "[ -~]{0,40}").prop_map(|(to, content)| Request::SendMessage {
            to,
            content,
            context: None,
        }),
        "[a-f0-9]{32}".prop_map(|handoff_id| Request::HandoffAccept { handoff_id }),
        ("[a-z]{1,8}", any::<Option<u8>>()).prop_map(|(task_id, percent)| {
            Request::ReportProgress {
                task_id,
                percent,
                note: None,
            }
        }),
    ]
}

proptest! {
    #[test]
    fn encode_then_decode_is_identity(request in arb_request()) {
        let frame = encode_frame(&request).unwrap();
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(&frame).unwrap();
        prop_assert_eq!(frames.len(), 1);
        let envelope = decode_request(&frames[0]).unwrap();
        prop_assert_eq!(envelope.request, request);
    }

    #[test]
    fn arbitrary_chunking_preserves_frames(
        requests in proptest::collection::vec(arb_request(), 1..5),
        chunk_size in 1usize..64,
    ) {
        let mut stream = Vec::new();
        for request in &requests {
            stream.extend(encode_frame(request).unwrap());
        }

        let mut decoder = FrameDecoder::new();
        let mut decoded = Vec::new();
        for chunk in stream.chunks(chunk_size) {
            for frame in decoder.push(chunk).unwrap() {
                decoded.push(decode_request(&frame).unwrap().request);
            }
        }
        prop_assert_eq!(decoded, requests);
        prop_assert_eq!(decoder.pending(), 0);
    }
}
