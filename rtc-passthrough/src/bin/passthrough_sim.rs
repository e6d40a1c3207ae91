/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Simulates a lossy network feeding the pass-through pipeline with a mock
//! platform decoder, so the recovery behavior can be watched end to end:
//!
//! ```sh
//! RUST_LOG=info cargo run --bin passthrough_sim
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use rand::Rng;

use rtc_passthrough::adapter::{
    AdapterFactory, DecoderBuffer, FeedType, MediaEventSink, PlatformDecoderAdapter,
    RestorePlaybackMode, SuspendReason, VideoDecoderConfig,
};
use rtc_passthrough::capability::StaticCapabilities;
use rtc_passthrough::codec::VideoCodec;
use rtc_passthrough::decoder::{
    CodecSettings, DecodeStatus, DecodedFrameSink, PassThroughVideoDecoder,
};
use rtc_passthrough::frame::{DecodedVideoFrame, EncodedImage, FrameType};

const TOTAL_FRAMES: u64 = 300;
const KEY_FRAME_INTERVAL: u64 = 30;
const LOSS_PROBABILITY: f64 = 0.05;

/// A stand-in for the platform hardware session: decodes nothing, but plays
/// back the asynchronous contract (ready notification, decoded output).
struct SimPlatformAdapter {
    events: Option<Arc<dyn MediaEventSink>>,
}

impl PlatformDecoderAdapter for SimPlatformAdapter {
    fn initialize(
        &mut self,
        config: &VideoDecoderConfig,
        events: Arc<dyn MediaEventSink>,
    ) -> rtc_passthrough::error::Result<()> {
        println!(
            "[PLATFORM] {} session up, coded size {}x{}",
            config.codec, config.coded_width, config.coded_height
        );
        events.pipeline_ready(Ok(()));
        self.events = Some(events);
        Ok(())
    }

    fn feed(
        &mut self,
        buffer: DecoderBuffer,
        _feed_type: FeedType,
    ) -> rtc_passthrough::error::Result<()> {
        if let Some(events) = &self.events {
            events.frame_decoded(DecodedVideoFrame {
                timestamp: buffer.timestamp,
                width: 640,
                height: 360,
                data: Vec::new(),
            });
        }
        Ok(())
    }

    fn set_playback_rate(&mut self, rate: f64) {
        println!("[PLATFORM] playback rate {rate}");
    }

    fn suspend(&mut self, _reason: SuspendReason) {}

    fn resume(&mut self, _position: Duration, _mode: RestorePlaybackMode) {}

    fn finalize(&mut self) {
        self.events = None;
        println!("[PLATFORM] session finalized");
    }
}

struct CountingSink(Arc<AtomicU64>);

impl DecodedFrameSink for CountingSink {
    fn decoded(&self, frame: DecodedVideoFrame, _qp: Option<i32>, _decode_time_ms: u32) {
        let delivered = self.0.fetch_add(1, Ordering::Relaxed) + 1;
        if delivered % 30 == 0 {
            println!(
                "[SINK] {delivered} frames delivered, latest at {:?}",
                frame.timestamp
            );
        }
    }
}

fn simulated_image(sequence: u64) -> EncodedImage {
    let frame_type = if sequence % KEY_FRAME_INTERVAL == 0 {
        FrameType::KeyFrame
    } else {
        FrameType::DeltaFrame
    };
    EncodedImage {
        data: vec![0u8; 1000],
        frame_type,
        timestamp_us: sequence * 33_333,
        encoded_width: 640,
        encoded_height: 360,
        spatial_index: None,
        complete_frame: true,
    }
}

fn main() -> Result<()> {
    env_logger::init();

    println!("--- Pass-Through Decode Pipeline Simulation ---");

    let capabilities = StaticCapabilities::with_codecs(&[VideoCodec::Vp9]);
    let factory: AdapterFactory = Box::new(|_codec| Box::new(SimPlatformAdapter { events: None }));

    let decoder = PassThroughVideoDecoder::create(&capabilities, factory, "VP9")
        .expect("VP9 should have a simulated hardware capability");

    let delivered = Arc::new(AtomicU64::new(0));
    decoder.register_decode_complete_callback(Box::new(CountingSink(Arc::clone(&delivered))));

    let settings = CodecSettings {
        codec: VideoCodec::Vp9,
        coded_width: 640,
        coded_height: 360,
    };
    assert_eq!(decoder.init_decode(Some(&settings), 1), DecodeStatus::Ok);

    // Network loop: frames arrive at a steady pace, a few of them lost.
    let decoder = Arc::new(decoder);
    let stats = Arc::new(Mutex::new((0u64, 0u64))); // (accepted, rejected)
    let network = {
        let decoder = Arc::clone(&decoder);
        let stats = Arc::clone(&stats);
        std::thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for sequence in 0..TOTAL_FRAMES {
                let lost = rng.gen_bool(LOSS_PROBABILITY);
                let image = simulated_image(sequence);
                let status = decoder.decode(&image, lost, 0);

                let mut stats = stats.lock().unwrap();
                match status {
                    DecodeStatus::Ok => stats.0 += 1,
                    _ => stats.1 += 1,
                }
                drop(stats);

                std::thread::sleep(Duration::from_millis(3));
            }
        })
    };

    network.join().expect("network thread panicked");
    decoder.release();

    let (accepted, rejected) = *stats.lock().unwrap();
    println!("--- Simulation finished ---");
    println!(
        "accepted: {accepted}, rejected: {rejected}, delivered: {}",
        delivered.load(Ordering::Relaxed)
    );

    Ok(())
}
