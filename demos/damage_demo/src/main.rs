// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated frame loop that exercises damage computation and its tracing.
//!
//! Runs 120 synthetic frames of a small scene (a static backdrop picture, a
//! sprite that moves for the first 20 frames, and a frosted-glass panel),
//! recording events to both a
//! [`PrettyPrintSink`](abrade_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](abrade_debug::recorder::RecorderSink), then exports a
//! Chrome trace JSON file.
//!
//! Once the sprite stops, nothing under the panel changes and after 60 quiet
//! frames the panel asks for a snapshot, which the loop "captures".

use std::fs::File;
use std::io::BufWriter;

use abrade_core::geometry::OutputSize;
use abrade_core::trace::{
    DamageAddedEvent, DamageSummary, DelegatePassEvent, FrameBeginEvent, TraceSink, Tracer,
};
use abrade_layers::{
    BackdropFilterLayer, BackdropPaint, BlurFilter, ContainerLayer, PictureLayer, ResourceKey,
    Scene, SceneNode,
};
use kurbo::{Point, Rect, Size};

use abrade_debug::pretty::PrettyPrintSink;
use abrade_debug::recorder::RecorderSink;

const FRAME_COUNT: u32 = 120;
const MOVING_FRAMES: u32 = 20;
const OUTPUT: OutputSize = OutputSize::new(320, 240);

/// Forwards every event to two sinks.
struct Tee<'a> {
    a: &'a mut dyn TraceSink,
    b: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.a.on_frame_begin(e);
        self.b.on_frame_begin(e);
    }

    fn on_delegate_pass(&mut self, e: &DelegatePassEvent) {
        self.a.on_delegate_pass(e);
        self.b.on_delegate_pass(e);
    }

    fn on_damage_summary(&mut self, s: &DamageSummary) {
        self.a.on_damage_summary(s);
        self.b.on_damage_summary(s);
    }

    fn on_damage_added(&mut self, e: &DamageAddedEvent) {
        self.a.on_damage_added(e);
        self.b.on_damage_added(e);
    }
}

fn build_scene(background: &SceneNode, frame_index: u32) -> SceneNode {
    let step = f64::from(frame_index.min(MOVING_FRAMES));
    let sprite = SceneNode::picture(PictureLayer::new(
        Point::new(20.0 + 8.0 * step, 60.0),
        Size::new(24.0, 24.0),
        ResourceKey(2),
    ));
    let label = SceneNode::picture(PictureLayer::new(
        Point::new(120.0, 110.0),
        Size::new(80.0, 16.0),
        ResourceKey(3),
    ));
    let panel = SceneNode::container(
        ContainerLayer::new(vec![SceneNode::backdrop(BackdropFilterLayer::new(
            BlurFilter::new(4.0),
            vec![label],
        ))])
        .with_clip(Rect::new(100.0, 80.0, 220.0, 160.0)),
    );
    SceneNode::container(ContainerLayer::new(vec![background.clone(), sprite, panel]))
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    let background = SceneNode::picture(PictureLayer::new(
        Point::ZERO,
        Size::new(320.0, 240.0),
        ResourceKey(1),
    ));
    let mut scene = Scene::new();
    let mut next_snapshot = 1000;

    // -- simulated loop ----------------------------------------------------
    for frame_index in 0..FRAME_COUNT {
        let root = build_scene(&background, frame_index);
        let result = {
            let mut tee = Tee {
                a: &mut pretty,
                b: &mut recorder,
            };
            let mut tracer = Tracer::new(&mut tee);
            scene.frame_traced(OUTPUT, &root, &mut tracer)
        };

        for backdrop in scene.backdrops().to_vec() {
            if backdrop.paint_mode() == BackdropPaint::CaptureSnapshot {
                next_snapshot += 1;
                backdrop.store_snapshot(ResourceKey(next_snapshot), scene.release_queue());
                println!("frame {frame_index}: captured backdrop snapshot {next_snapshot}");
            }
        }
        for key in scene.release_queue().drain() {
            println!("frame {frame_index}: release {key:?}");
        }
        if !result.area.is_empty() {
            println!(
                "frame {frame_index}: redraw {:?} ({} contributions)",
                result.damage(),
                result.snapshot.len()
            );
        }
    }

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    abrade_debug::chrome::export(recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({FRAME_COUNT} frames)");
}
