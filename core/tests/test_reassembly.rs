// Decoder suite: state machine transitions, error kinds, restart policy,
// abort semantics and the caller-driven frame gap.

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use diag_core::{
        config::{ProtocolConfig, RestartPolicy},
        link::LinkFrame,
        message::DiagMessage,
        protocol::{generate_frames, DiagProtocol, ProtocolError, SequenceFault},
    };

    const ID: u32 = 0x6F1;

    fn frame(bytes: &[u8]) -> LinkFrame {
        LinkFrame::new(ID, bytes).unwrap()
    }

    fn ten_bytes() -> (LinkFrame, LinkFrame) {
        (
            frame(&[0x20, 0x10, 0x0A, 0xB0, 0xB1, 0xB2, 0xB3, 0xB4]),
            frame(&[0x20, 0x21, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9]),
        )
    }

// # ✅ 1. Single frame

    #[test]
    fn single_frame_completes_immediately() {
        let mut rx = DiagProtocol::new();
        let msg = rx.parse_frame(&frame(&[0x10, 0x01, 0xAA])).unwrap().unwrap();

        assert_eq!(msg.declared_length(), 1);
        assert_eq!(msg.data, vec![0xAA]);
        assert_eq!(msg.destination, 0x10);
        assert_eq!(msg.id, ID);
        assert!(rx.is_idle());
    }

    #[test]
    fn single_frame_ignores_padding() {
        let mut rx = DiagProtocol::new();
        let msg = rx
            .parse_frame(&frame(&[0x10, 0x02, 0x01, 0x02, 0xCC, 0xCC, 0xCC, 0xCC]))
            .unwrap()
            .unwrap();
        assert_eq!(msg.data, vec![0x01, 0x02]);
    }

// # ✅ 2. First + consecutive

    #[test]
    fn first_and_consecutive_reassemble() {
        let (ff, cf) = ten_bytes();
        let mut rx = DiagProtocol::new();

        assert_eq!(rx.parse_frame(&ff).unwrap(), None);
        assert!(rx.is_receiving());
        assert_eq!(rx.progress(), Some((5, 10)));
        assert_eq!(rx.expected_sequence(), Some(1));

        let msg = rx.parse_frame(&cf).unwrap().unwrap();
        assert_eq!(msg.data, (0xB0..0xBA).collect::<Vec<u8>>());
        assert_eq!(msg.declared_length(), 10);
        assert_eq!(msg.destination, 0x20);
        assert!(rx.is_idle());
    }

    #[test]
    fn decoding_wraps_sequence_numbers() {
        let data: Vec<u8> = (0..200).map(|i| (i * 7) as u8).collect();
        let m = DiagMessage::new(ID, 0x29, data.clone()).unwrap();
        let frames = generate_frames(&m);
        assert!(frames.len() > 17);

        let mut rx = DiagProtocol::new();
        let (last, head) = frames.split_last().unwrap();
        for f in head {
            assert_eq!(rx.parse_frame(f).unwrap(), None);
        }
        let out = rx.parse_frame(last).unwrap().unwrap();
        assert_eq!(out.data, data);
    }

    #[test]
    fn padded_last_consecutive_frame_completes_and_resets() {
        let (ff, _) = ten_bytes();
        let padded = frame(&[0x20, 0x21, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xCC]);
        let mut rx = DiagProtocol::new();

        rx.parse_frame(&ff).unwrap();
        let msg = rx.parse_frame(&padded).unwrap().unwrap();
        assert_eq!(msg.data, (0xB0..0xBA).collect::<Vec<u8>>());
        assert_eq!(msg.id, ID);
        assert!(rx.is_idle());
        assert_eq!(rx.progress(), None);
        assert_eq!(rx.counters().messages_completed, 1);
        assert_eq!(rx.counters().frames_rejected, 0);

        // handler is immediately reusable
        let (ff, cf) = ten_bytes();
        rx.parse_frame(&ff).unwrap();
        assert_eq!(rx.parse_frame(&cf).unwrap().unwrap().data.len(), 10);
    }

// # ❌ 3. Sequence errors

    #[test]
    fn consecutive_before_first_is_a_sequence_error() {
        let mut rx = DiagProtocol::new();
        let err = rx.parse_frame(&frame(&[0x20, 0x21, 1, 2, 3, 4, 5, 6])).unwrap_err();

        assert_eq!(
            err,
            ProtocolError::SequenceError(SequenceFault::NoFirstFrame { got: 1 })
        );
        assert!(rx.is_idle());
    }

    #[test]
    fn out_of_order_consecutive_keeps_progress() {
        let (ff, cf) = ten_bytes();
        let mut rx = DiagProtocol::new();
        rx.parse_frame(&ff).unwrap();

        let bad = frame(&[0x20, 0x22, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9]);
        let err = rx.parse_frame(&bad).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::SequenceError(SequenceFault::OutOfOrder { expected: 1, got: 2 })
        );

        // state left as it was before the bad frame
        assert_eq!(rx.progress(), Some((5, 10)));
        assert!(rx.parse_frame(&cf).unwrap().is_some());
    }

// # ❌ 4. Length errors

    #[test]
    fn single_frame_length_zero_is_invalid() {
        let mut rx = DiagProtocol::new();
        let err = rx.parse_frame(&frame(&[0x10, 0x00, 0xAA])).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidLength { length: 0, .. }));
    }

    #[test]
    fn single_frame_length_seven_is_invalid() {
        let mut rx = DiagProtocol::new();
        let err = rx
            .parse_frame(&frame(&[0x10, 0x07, 1, 2, 3, 4, 5, 6]))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidLength { length: 7, .. }));
    }

    #[test]
    fn first_frame_with_short_length_is_invalid() {
        let mut rx = DiagProtocol::new();
        let err = rx
            .parse_frame(&frame(&[0x10, 0x10, 0x06, 1, 2, 3, 4, 5]))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidLength { length: 6, .. }));
        assert!(rx.is_idle());
    }

    #[test]
    fn invalid_single_frame_does_not_disturb_progress() {
        let (ff, cf) = ten_bytes();
        let mut rx = DiagProtocol::new();
        rx.parse_frame(&ff).unwrap();

        rx.parse_frame(&frame(&[0x10, 0x0F])).unwrap_err();
        assert_eq!(rx.progress(), Some((5, 10)));
        assert!(rx.parse_frame(&cf).unwrap().is_some());
    }

// # ❌ 5. Malformed frames

    #[test]
    fn unknown_discriminator_is_rejected() {
        let mut rx = DiagProtocol::new();
        for pci in [0x40u8, 0x5F, 0xF0] {
            let err = rx.parse_frame(&frame(&[0x10, pci, 0])).unwrap_err();
            assert_eq!(err, ProtocolError::UnknownDiscriminator(pci >> 4));
        }
    }

    #[test]
    fn frame_without_pci_is_truncated() {
        let mut rx = DiagProtocol::new();
        let err = rx.parse_frame(&frame(&[0x10])).unwrap_err();
        assert_eq!(err, ProtocolError::TruncatedFrame { need: 2, have: 1 });
    }

    #[test]
    fn short_single_frame_is_truncated() {
        let mut rx = DiagProtocol::new();
        let err = rx.parse_frame(&frame(&[0x10, 0x05, 1, 2, 3])).unwrap_err();
        assert_eq!(err, ProtocolError::TruncatedFrame { need: 7, have: 5 });
    }

    #[test]
    fn short_consecutive_frame_is_truncated() {
        let (ff, _) = ten_bytes();
        let mut rx = DiagProtocol::new();
        rx.parse_frame(&ff).unwrap();

        let err = rx.parse_frame(&frame(&[0x20, 0x21, 0xB5])).unwrap_err();
        assert_eq!(err, ProtocolError::TruncatedFrame { need: 7, have: 3 });
        assert_eq!(rx.progress(), Some((5, 10)));
    }

// # ✅ 6. Flow control is a no-op

    #[test]
    fn flow_control_leaves_state_alone() {
        let (ff, cf) = ten_bytes();
        let mut rx = DiagProtocol::new();

        assert_eq!(rx.parse_frame(&frame(&[0x20, 0x30, 0x00, 0x00])).unwrap(), None);
        assert!(rx.is_idle());

        rx.parse_frame(&ff).unwrap();
        assert_eq!(rx.parse_frame(&frame(&[0x20, 0x30, 0x08, 0x14])).unwrap(), None);
        assert_eq!(rx.progress(), Some((5, 10)));
        assert!(rx.parse_frame(&cf).unwrap().is_some());
        assert_eq!(rx.counters().frames_flow_control, 2);
    }

// # 7. Restart policy

    #[test]
    fn restart_policy_drops_partial_message() {
        let (ff, _) = ten_bytes();
        let mut rx = DiagProtocol::new();
        rx.parse_frame(&ff).unwrap();

        let msg = rx.parse_frame(&frame(&[0x10, 0x01, 0xAA])).unwrap().unwrap();
        assert_eq!(msg.data, vec![0xAA]);
        assert!(rx.is_idle());
        assert_eq!(rx.counters().messages_discarded, 1);
    }

    #[test]
    fn restart_on_first_frame_starts_clean() {
        let (ff, cf) = ten_bytes();
        let mut rx = DiagProtocol::new();
        rx.parse_frame(&ff).unwrap();
        rx.parse_frame(&ff).unwrap();

        assert_eq!(rx.progress(), Some((5, 10)));
        assert_eq!(rx.expected_sequence(), Some(1));
        assert!(rx.parse_frame(&cf).unwrap().is_some());
    }

    #[test]
    fn reject_policy_keeps_partial_message() {
        let (ff, cf) = ten_bytes();
        let cfg = ProtocolConfig::default().with_restart_policy(RestartPolicy::Reject);
        let mut rx = DiagProtocol::with_config(cfg);
        rx.parse_frame(&ff).unwrap();

        let err = rx.parse_frame(&frame(&[0x10, 0x01, 0xAA])).unwrap_err();
        assert_eq!(err, ProtocolError::MessageInProgress { declared: 10, received: 5 });

        let err = rx.parse_frame(&ff).unwrap_err();
        assert!(matches!(err, ProtocolError::MessageInProgress { .. }));

        assert!(rx.parse_frame(&cf).unwrap().is_some());
        assert_eq!(rx.counters().messages_discarded, 0);
    }

// # 8. Abort

    #[test]
    fn reset_on_idle_is_a_no_op() {
        let mut rx = DiagProtocol::new();
        rx.reset();
        rx.reset();
        assert!(rx.is_idle());
        assert_eq!(rx.counters().messages_discarded, 0);
    }

    #[test]
    fn reset_clears_progress() {
        let (ff, cf) = ten_bytes();
        let mut rx = DiagProtocol::new();
        rx.parse_frame(&ff).unwrap();

        rx.reset();
        assert!(rx.is_idle());
        assert_eq!(rx.progress(), None);
        assert_eq!(rx.counters().messages_discarded, 1);

        // the orphaned consecutive frame is now out of context
        assert!(rx.parse_frame(&cf).unwrap_err().is_sequence_error());

        let msg = rx.parse_frame(&frame(&[0x10, 0x01, 0xAA])).unwrap().unwrap();
        assert_eq!(msg.data, vec![0xAA]);
    }

// # 9. Caller-driven frame gap

    #[test]
    fn stale_message_expires_before_next_frame() {
        let (ff, cf) = ten_bytes();
        let cfg = ProtocolConfig::default().with_max_frame_gap(Duration::from_millis(100));
        let mut rx = DiagProtocol::with_config(cfg);

        let t0 = Instant::now();
        rx.parse_frame_at(&ff, t0).unwrap();

        let err = rx
            .parse_frame_at(&cf, t0 + Duration::from_millis(250))
            .unwrap_err();
        assert!(err.is_sequence_error());
        assert_eq!(rx.counters().messages_expired, 1);
    }

    #[test]
    fn frames_within_gap_complete() {
        let (ff, cf) = ten_bytes();
        let cfg = ProtocolConfig::default().with_max_frame_gap(Duration::from_millis(100));
        let mut rx = DiagProtocol::with_config(cfg);

        let t0 = Instant::now();
        rx.parse_frame_at(&ff, t0).unwrap();
        assert!(!rx.expire(t0 + Duration::from_millis(50)));
        assert!(rx
            .parse_frame_at(&cf, t0 + Duration::from_millis(90))
            .unwrap()
            .is_some());
    }

    #[test]
    fn expire_without_gap_never_fires() {
        let (ff, _) = ten_bytes();
        let mut rx = DiagProtocol::new();

        let t0 = Instant::now();
        rx.parse_frame_at(&ff, t0).unwrap();
        assert!(!rx.expire(t0 + Duration::from_secs(3600)));
        assert!(rx.is_receiving());
    }

    #[test]
    fn gap_is_measured_from_last_accepted_frame() {
        let data: Vec<u8> = (0..30).collect();
        let frames = generate_frames(&DiagMessage::new(ID, 0x10, data.clone()).unwrap());
        let cfg = ProtocolConfig::default().with_max_frame_gap(Duration::from_millis(100));
        let mut rx = DiagProtocol::with_config(cfg);

        let t0 = Instant::now();
        let mut out = None;
        for (i, f) in frames.iter().enumerate() {
            // 80 ms apart: the whole message spans far more than the gap
            out = rx.parse_frame_at(f, t0 + Duration::from_millis(80 * i as u64)).unwrap();
        }
        assert_eq!(out.unwrap().data, data);
    }

    #[test]
    fn untimed_frames_keep_a_timed_message_alive() {
        let data: Vec<u8> = (0..30).collect();
        let frames = generate_frames(&DiagMessage::new(ID, 0x10, data.clone()).unwrap());
        assert_eq!(frames.len(), 6);
        let cfg = ProtocolConfig::default().with_max_frame_gap(Duration::from_millis(100));
        let mut rx = DiagProtocol::with_config(cfg);

        let t0 = Instant::now();
        assert_eq!(rx.parse_frame_at(&frames[0], t0).unwrap(), None);
        for f in &frames[1..4] {
            assert_eq!(rx.parse_frame(f).unwrap(), None);
        }

        // 150 ms after the first frame, but the last accepted frame had no timestamp
        assert_eq!(rx.parse_frame_at(&frames[4], t0 + Duration::from_millis(150)).unwrap(), None);
        assert!(rx.is_receiving());

        let msg = rx.parse_frame_at(&frames[5], t0 + Duration::from_millis(200)).unwrap();
        assert_eq!(msg.unwrap().data, data);
        assert_eq!(rx.counters().messages_expired, 0);
    }

    #[test]
    fn timed_frame_restarts_the_clock_after_untimed_ones() {
        let data: Vec<u8> = (0..30).collect();
        let frames = generate_frames(&DiagMessage::new(ID, 0x10, data).unwrap());
        let cfg = ProtocolConfig::default().with_max_frame_gap(Duration::from_millis(100));
        let mut rx = DiagProtocol::with_config(cfg);

        let t0 = Instant::now();
        rx.parse_frame(&frames[0]).unwrap();
        rx.parse_frame_at(&frames[1], t0).unwrap();

        let err = rx.parse_frame_at(&frames[2], t0 + Duration::from_millis(150)).unwrap_err();
        assert!(err.is_sequence_error());
        assert!(rx.is_idle());
        assert_eq!(rx.counters().messages_expired, 1);
    }

    #[test]
    fn sub_millisecond_gap_does_not_expire_everything() {
        let cfg = ProtocolConfig::default().with_max_frame_gap(Duration::from_micros(500));
        assert_eq!(cfg.max_frame_gap(), Some(Duration::from_millis(1)));
        let mut rx = DiagProtocol::with_config(cfg);
        let (first, second) = ten_bytes();

        let t0 = Instant::now();
        rx.parse_frame_at(&first, t0).unwrap();
        let msg = rx.parse_frame_at(&second, t0 + Duration::from_micros(100)).unwrap();
        assert_eq!(msg.unwrap().data.len(), 10);
        assert_eq!(rx.counters().messages_expired, 0);
    }

// # 10. Batch feed

    #[test]
    fn feed_collects_every_message() {
        let a = DiagMessage::new(ID, 0x10, vec![0xAA]).unwrap();
        let b = DiagMessage::new(ID, 0x20, (0..50).collect::<Vec<u8>>()).unwrap();

        let mut frames = generate_frames(&a);
        frames.extend(generate_frames(&b));

        let mut rx = DiagProtocol::new();
        assert_eq!(rx.feed(&frames).unwrap(), vec![a, b]);
    }

    #[test]
    fn feed_stops_at_first_error() {
        let (_, cf) = ten_bytes();
        let mut rx = DiagProtocol::new();
        assert!(rx.feed([&cf]).is_err());
    }
}
