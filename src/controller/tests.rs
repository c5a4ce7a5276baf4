//! LearnedController 钩子集的测试
//! Tests for the LearnedController hook set

use super::*;
use crate::features::{INPUT_SCALE, NUM_INPUT_METRICS};
use crate::flow::Lifecycle;
use crate::pacing::PacingStatus;
use crate::testing::{FixedRateService, MockSocket, UnavailableService};
use std::num::NonZeroU64;

fn config(history_len: usize) -> Config {
    let mut config = Config::default();
    config.flow.history_len = history_len;
    config
}

fn sample(rtt_us: i64) -> RateSample {
    RateSample {
        delivered: 10,
        interval_us: 20_000,
        rtt_us,
        prior_mstamp_us: 5_000,
    }
}

fn started(controller: &LearnedController) -> MockSocket {
    let mut sk = MockSocket::new();
    sk.sent.record(sk.first_tx_mstamp, 20_000);
    controller.init(&mut sk);
    sk
}

#[test]
fn test_init_manages_flow_and_requests_pacing() {
    let controller = LearnedController::new(config(4), Arc::new(FixedRateService::new(1)));
    let sk = started(&controller);

    assert_eq!(sk.ca.lifecycle(), Lifecycle::Managed);
    assert_eq!(sk.pacing_status, PacingStatus::Needed);
    assert!(sk.ecn_transmit);
    assert_eq!(sk.ca.last_acked_sequence(), sk.snd_una);
}

#[test]
fn test_init_without_ecn_disables_ect_marking() {
    let controller = LearnedController::new(config(4), Arc::new(FixedRateService::new(1)));
    let mut sk = MockSocket::new();
    sk.ecn_ok = false;
    sk.pacing_status = PacingStatus::Fq;
    controller.init(&mut sk);

    assert!(!sk.ecn_transmit);
    assert_eq!(sk.pacing_status, PacingStatus::Fq);
}

#[test]
fn test_model_rate_is_applied_verbatim() {
    let controller =
        LearnedController::new(config(4), Arc::new(FixedRateService::new(12_500_000)));
    let mut sk = started(&controller);

    controller.cong_control(&mut sk, &sample(5_000));
    assert_eq!(sk.pacing_rate, 12_500_000);
    assert_eq!(sk.ca.cursor(), 1);
}

/// 模型不可用：速率保持不变，游标前进一格
#[test]
fn test_unavailable_model_keeps_previous_rate() {
    let controller = LearnedController::new(config(4), Arc::new(UnavailableService));
    let mut sk = started(&controller);
    sk.pacing_rate = 777;

    controller.cong_control(&mut sk, &sample(5_000));
    assert_eq!(sk.pacing_rate, 777);
    assert_eq!(sk.ca.cursor(), 1);
}

#[test]
fn test_invalid_sample_keeps_rate_and_cursor() {
    let service = Arc::new(FixedRateService::new(9_000));
    let controller = LearnedController::new(config(4), service.clone());
    let mut sk = started(&controller);
    sk.pacing_rate = 777;

    for bad in [
        RateSample { delivered: 0, ..sample(5_000) },
        RateSample { interval_us: 0, ..sample(5_000) },
        sample(0),
        sample(-3),
    ] {
        controller.cong_control(&mut sk, &bad);
    }
    assert_eq!(sk.pacing_rate, 777);
    assert_eq!(sk.ca.cursor(), 0);
    assert_eq!(sk.ca.min_rtt_us(), None);
    assert_eq!(service.queries(), 0);
}

#[test]
fn test_hooks_on_unmanaged_flow_are_noops() {
    let service = Arc::new(FixedRateService::new(9_000));
    let controller = LearnedController::new(config(4), service.clone());
    let mut sk = MockSocket::new();
    sk.pacing_rate = 100;

    controller.cong_control(&mut sk, &sample(5_000));
    controller.in_ack_event(&mut sk, AckFlags::NONE);
    controller.release(&mut sk);

    assert_eq!(sk.pacing_rate, 100);
    assert_eq!(sk.ca.lifecycle(), Lifecycle::Uninitialized);
    assert_eq!(service.queries(), 0);
}

#[test]
fn test_released_flow_ignores_events() {
    let service = Arc::new(FixedRateService::new(9_000));
    let controller = LearnedController::new(config(4), service.clone());
    let mut sk = started(&controller);

    controller.release(&mut sk);
    controller.release(&mut sk);
    assert_eq!(sk.ca.lifecycle(), Lifecycle::Released);

    controller.cong_control(&mut sk, &sample(5_000));
    assert_eq!(sk.pacing_rate, 0);
    assert_eq!(service.queries(), 0);
}

#[test]
fn test_ack_event_books_acked_segments() {
    let controller = LearnedController::new(config(4), Arc::new(FixedRateService::new(1)));
    let mut sk = started(&controller);

    sk.snd_una += sk.mss;
    controller.in_ack_event(&mut sk, AckFlags::NONE);
    sk.snd_una += sk.mss;
    controller.in_ack_event(&mut sk, AckFlags::SLOWPATH | AckFlags::ECE);

    let delta = sk.ca.last_ack();
    assert_eq!(delta.segments, 1);
    assert_eq!(delta.bytes, sk.mss);
    assert!(delta.ecn);
    assert_eq!(sk.ca.last_acked_sequence(), sk.snd_una);
}

#[test]
fn test_send_duration_comes_from_socket_record() {
    let service = Arc::new(FixedRateService::new(1));
    let controller = LearnedController::new(config(2), service.clone());

    let mut sk = started(&controller);
    controller.cong_control(&mut sk, &sample(5_000));
    assert_eq!(service.last_input()[1], 1_250);

    // 没有匹配的发送记录时回退到中性比值
    sk.first_tx_mstamp = 999;
    controller.cong_control(&mut sk, &sample(5_000));
    assert_eq!(service.last_input()[1], INPUT_SCALE);
}

#[test]
fn test_telemetry_reports_every_interval() {
    let mut config = config(2);
    config.telemetry.report_interval = NonZeroU64::new(2);
    let channel = TelemetryChannel::open(8);
    let mut rx = channel.subscribe();
    let controller = LearnedController::new(config, Arc::new(UnavailableService))
        .with_telemetry(channel);
    let mut sk = started(&controller);

    controller.cong_control(&mut sk, &sample(5_000));
    assert!(rx.try_recv().is_err());

    controller.cong_control(&mut sk, &sample(5_000));
    let report = rx.try_recv().unwrap();
    assert_eq!(report.payload.len(), 2 * NUM_INPUT_METRICS * 8);
    assert_eq!(report.values(), sk.ca.model_input().to_vec());

    // 无效样本不计入上报间隔
    controller.cong_control(&mut sk, &sample(0));
    controller.cong_control(&mut sk, &sample(5_000));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_pass_through_hooks() {
    let controller = LearnedController::new(config(4), Arc::new(FixedRateService::new(1)));
    let mut sk = MockSocket::new();
    sk.snd_cwnd = 20;
    sk.snd_ssthresh = 15;
    assert_eq!(controller.ssthresh(&sk), 10);
    assert_eq!(controller.undo_cwnd(&sk), 30);

    sk.snd_cwnd = 1;
    assert_eq!(controller.ssthresh(&sk), 2);
    assert_eq!(<LearnedController as CongestionOps<MockSocket>>::name(&controller), "learned_cc");
}
