// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene trees and the per-frame walk.
//!
//! A [`Scene`] owns one [`DamageContext`] and the previous frame's snapshot
//! for a render target. Each call to [`Scene::frame`] walks a tree of
//! [`SceneNode`]s in paint order, appends every contributing layer, and
//! returns the frame's damage.

use alloc::rc::Rc;
use alloc::vec::Vec;

use abrade_core::config::DamageConfig;
use abrade_core::context::{DamageContext, DamageResult};
use abrade_core::filter::FilterBounds;
use abrade_core::geometry::{OutputSize, rect_is_empty};
use abrade_core::layer::{Layer, LayerRef};
use abrade_core::mutator::{Mutator, MutatorStack};
use abrade_core::snapshot::FrameSnapshot;
use abrade_core::trace::Tracer;
use kurbo::{Affine, Rect};

use crate::backdrop::{BackdropFilterLayer, SharedBackdropCache};
use crate::container::ContainerLayer;
use crate::picture::PictureLayer;
use crate::release::ReleaseQueue;
use crate::texture::TextureLayer;

/// A node of a scene tree.
///
/// Nodes are reference counted so that successive trees can share unchanged
/// subtrees.
#[derive(Clone, Debug)]
pub enum SceneNode {
    /// A recorded picture.
    Picture(Rc<PictureLayer>),
    /// An external texture.
    Texture(Rc<TextureLayer>),
    /// A group.
    Container(Rc<ContainerLayer>),
    /// A group drawn over a filtered backdrop.
    Backdrop(Rc<BackdropFilterLayer>),
}

impl SceneNode {
    /// Wraps a picture layer.
    #[must_use]
    pub fn picture(layer: PictureLayer) -> Self {
        Self::Picture(Rc::new(layer))
    }

    /// Wraps a texture layer.
    #[must_use]
    pub fn texture(layer: TextureLayer) -> Self {
        Self::Texture(Rc::new(layer))
    }

    /// Wraps a container layer.
    #[must_use]
    pub fn container(layer: ContainerLayer) -> Self {
        Self::Container(Rc::new(layer))
    }

    /// Wraps a backdrop filter layer.
    #[must_use]
    pub fn backdrop(layer: BackdropFilterLayer) -> Self {
        Self::Backdrop(Rc::new(layer))
    }

    /// The node as a shared layer.
    #[must_use]
    pub fn layer(&self) -> LayerRef {
        match self {
            Self::Picture(l) => l.clone(),
            Self::Texture(l) => l.clone(),
            Self::Container(l) => l.clone(),
            Self::Backdrop(l) => l.clone(),
        }
    }

    /// Paint bounds in the parent's coordinate space.
    ///
    /// For groups these are the bounds computed by the most recent walk.
    #[must_use]
    pub fn bounds_in_parent(&self) -> Rect {
        match self {
            Self::Picture(l) => l.paint_bounds(),
            Self::Texture(l) => l.paint_bounds(),
            Self::Container(l) => {
                let bounds = l.paint_bounds();
                if rect_is_empty(bounds) {
                    Rect::ZERO
                } else {
                    l.transform().transform_rect_bbox(bounds)
                }
            }
            Self::Backdrop(l) => l.paint_bounds(),
        }
    }
}

/// Damage tracking state for one render target.
#[derive(Debug, Default)]
pub struct Scene {
    context: DamageContext,
    previous: Option<Rc<FrameSnapshot>>,
    backdrops: Vec<Rc<BackdropFilterLayer>>,
    caches: Vec<SharedBackdropCache>,
    release: ReleaseQueue,
}

impl Scene {
    /// Creates a scene with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scene with an explicit configuration.
    #[must_use]
    pub fn with_config(config: DamageConfig) -> Self {
        Self {
            context: DamageContext::with_config(config),
            ..Self::default()
        }
    }

    /// The underlying damage context.
    #[must_use]
    pub fn context(&self) -> &DamageContext {
        &self.context
    }

    /// Snapshot of the last frame, if any.
    #[must_use]
    pub fn previous(&self) -> Option<&Rc<FrameSnapshot>> {
        self.previous.as_ref()
    }

    /// Backdrop filters of the last frame, in paint order.
    ///
    /// After a frame, ask each for its
    /// [`paint_mode`](BackdropFilterLayer::paint_mode).
    #[must_use]
    pub fn backdrops(&self) -> &[Rc<BackdropFilterLayer>] {
        &self.backdrops
    }

    /// Resources the renderer should free.
    pub fn release_queue(&mut self) -> &mut ReleaseQueue {
        &mut self.release
    }

    /// Forgets the previous frame; the next frame damages the whole output.
    ///
    /// Call this when the render target's contents were lost.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Walks `root` and computes the frame's damage.
    pub fn frame(&mut self, output_size: OutputSize, root: &SceneNode) -> DamageResult {
        self.frame_traced(output_size, root, &mut Tracer::none())
    }

    /// Like [`frame`](Self::frame), emitting trace events.
    pub fn frame_traced(
        &mut self,
        output_size: OutputSize,
        root: &SceneNode,
        tracer: &mut Tracer<'_>,
    ) -> DamageResult {
        self.context
            .init_traced(output_size, self.previous.take(), tracer);
        self.backdrops.clear();

        let mut walker = Walker {
            context: &mut self.context,
            mutators: MutatorStack::new(),
            backdrops: &mut self.backdrops,
        };
        walker.visit(root, Affine::IDENTITY, output_size.bounds().to_rect());

        let result = self.context.finish_traced(tracer);
        for backdrop in &self.backdrops {
            backdrop.settle(&mut self.release);
        }
        self.release_dropped_caches();
        self.previous = Some(result.snapshot.clone());
        result
    }

    /// Releases snapshots of backdrops that have no successor in this frame.
    fn release_dropped_caches(&mut self) {
        let mut live: Vec<SharedBackdropCache> = Vec::with_capacity(self.backdrops.len());
        for cache in self.backdrops.iter().filter_map(|b| b.cache()) {
            if !live.iter().any(|c| Rc::ptr_eq(c, &cache)) {
                live.push(cache);
            }
        }
        for old in self.caches.drain(..) {
            if live.iter().any(|c| Rc::ptr_eq(c, &old)) {
                continue;
            }
            if let Some(key) = old.borrow_mut().take_snapshot() {
                self.release.schedule(key);
            }
        }
        self.caches = live;
    }
}

/// Depth-first walk appending contributions in paint order.
struct Walker<'a> {
    context: &'a mut DamageContext,
    mutators: MutatorStack,
    backdrops: &'a mut Vec<Rc<BackdropFilterLayer>>,
}

impl Walker<'_> {
    /// `transform` maps the node's parent space to the screen; `cull` is in
    /// the parent space.
    fn visit(&mut self, node: &SceneNode, transform: Affine, cull: Rect) {
        match node {
            SceneNode::Picture(l) => {
                self.context
                    .append(l.clone(), transform, cull, &self.mutators);
            }
            SceneNode::Texture(l) => {
                self.context
                    .append(l.clone(), transform, cull, &self.mutators);
            }
            SceneNode::Container(l) => self.visit_container(l, transform, cull),
            SceneNode::Backdrop(l) => self.visit_backdrop(l, transform, cull),
        }
    }

    /// Walks children, returning the union of their bounds in `cull`'s space.
    fn visit_children(&mut self, children: &[SceneNode], transform: Affine, cull: Rect) -> Rect {
        let mut bounds = Rect::ZERO;
        for child in children {
            self.visit(child, transform, cull);
            let child_bounds = child.bounds_in_parent();
            if rect_is_empty(child_bounds) {
                continue;
            }
            bounds = if rect_is_empty(bounds) {
                child_bounds
            } else {
                bounds.union(child_bounds)
            };
        }
        bounds
    }

    fn visit_container(&mut self, layer: &Rc<ContainerLayer>, transform: Affine, cull: Rect) {
        let local = layer.transform();
        let det = local.determinant();
        if det == 0.0 || !det.is_finite() {
            layer.set_bounds(Rect::ZERO);
            return;
        }
        let child_transform = transform * local;
        let mut child_cull = local.inverse().transform_rect_bbox(cull);

        let depth = self.mutators.len();
        self.mutators.push(Mutator::Transform(local));
        if let Some(clip) = layer.clip() {
            child_cull = child_cull.intersect(clip);
            self.mutators.push(Mutator::ClipRect(clip));
        }
        if let Some(alpha) = layer.opacity() {
            self.mutators.push(Mutator::Opacity(alpha));
        }

        // Bounds are fixed up once the children are known.
        let background = if layer.background().is_some() {
            self.context
                .append(layer.clone(), child_transform, child_cull, &self.mutators)
        } else {
            None
        };

        let blur = layer.blur();
        if let Some(blur) = blur {
            self.mutators.push(Mutator::ImageFilter(blur.key()));
        }
        let since = self.context.contribution_count();
        let mut bounds = self.visit_children(layer.children(), child_transform, child_cull);
        if let Some(blur) = blur
            && !rect_is_empty(bounds)
        {
            bounds = blur.fast_bounds(bounds);
            self.context
                .apply_image_filter(since, &blur, child_transform, bounds);
        }
        if let Some(clip) = layer.clip() {
            bounds = bounds.intersect(clip);
        }
        layer.set_bounds(if rect_is_empty(bounds) {
            Rect::ZERO
        } else {
            bounds
        });

        if let Some(id) = background {
            self.context.update_paint_bounds(id);
        }
        while self.mutators.len() > depth {
            self.mutators.pop();
        }
    }

    fn visit_backdrop(&mut self, layer: &Rc<BackdropFilterLayer>, transform: Affine, cull: Rect) {
        let filter_bounds = layer.filter().fast_bounds(cull);
        let id = self.context.append_with_bounds(
            layer.clone(),
            transform,
            filter_bounds,
            cull,
            &self.mutators,
        );
        if let Some(id) = id {
            layer.begin_frame(self.context, id, transform, filter_bounds);
        }

        let children = self.visit_children(layer.children(), transform, cull);
        let own = if rect_is_empty(cull) { Rect::ZERO } else { cull };
        layer.set_bounds(if rect_is_empty(children) {
            own
        } else if rect_is_empty(own) {
            children
        } else {
            own.union(children)
        });
        self.backdrops.push(layer.clone());
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use abrade_core::geometry::PixelRect;
    use kurbo::{Point, Size};

    use super::*;
    use crate::backdrop::{BackdropPaint, SNAPSHOT_THRESHOLD};
    use crate::blur::BlurFilter;
    use crate::resource::ResourceKey;

    const SIZE: OutputSize = OutputSize::new(100, 100);

    fn picture(x: f64, y: f64, w: f64, h: f64, key: u64) -> SceneNode {
        SceneNode::picture(PictureLayer::new(
            Point::new(x, y),
            Size::new(w, h),
            ResourceKey(key),
        ))
    }

    fn root(children: Vec<SceneNode>) -> SceneNode {
        SceneNode::container(ContainerLayer::new(children))
    }

    #[test]
    fn static_scene_is_damaged_once() {
        let mut scene = Scene::new();
        let tree = root(vec![picture(10.0, 10.0, 20.0, 20.0, 1)]);

        let first = scene.frame(SIZE, &tree);
        assert!(first.full);
        assert_eq!(first.damage(), SIZE.bounds());

        let second = scene.frame(SIZE, &tree);
        assert!(!second.full);
        assert!(second.area.is_empty());
        assert_eq!(second.snapshot.len(), 1);
    }

    #[test]
    fn moving_a_picture_damages_both_positions() {
        let mut scene = Scene::new();
        let still = picture(0.0, 0.0, 5.0, 5.0, 1);
        scene.frame(SIZE, &root(vec![still.clone(), picture(10.0, 10.0, 10.0, 10.0, 2)]));

        let result = scene.frame(SIZE, &root(vec![still, picture(30.0, 10.0, 10.0, 10.0, 2)]));
        assert_eq!(result.damage(), PixelRect::new(10, 10, 40, 20));
        assert_eq!(result.stats.added, 1);
        assert_eq!(result.stats.removed, 1);
    }

    #[test]
    fn textures_damage_every_frame() {
        let mut scene = Scene::new();
        let tree = || {
            root(vec![SceneNode::texture(TextureLayer::new(
                Point::new(5.0, 5.0),
                Size::new(10.0, 10.0),
                ResourceKey(3),
            ))])
        };
        scene.frame(SIZE, &tree());
        for _ in 0..3 {
            assert_eq!(scene.frame(SIZE, &tree()).damage(), PixelRect::new(5, 5, 15, 15));
        }

        // A retained layer object asserts its texture did not change.
        let retained = tree();
        scene.frame(SIZE, &retained);
        assert!(scene.frame(SIZE, &retained).area.is_empty());
    }

    #[test]
    fn container_background_follows_children() {
        let mut scene = Scene::new();
        let a = picture(0.0, 0.0, 10.0, 10.0, 1);
        let tree = |b: SceneNode| {
            root(vec![SceneNode::container(
                ContainerLayer::new(vec![a.clone(), b]).with_background(0xff20_2020),
            )])
        };

        let first = scene.frame(SIZE, &tree(picture(20.0, 20.0, 10.0, 10.0, 2)));
        let background = first.snapshot.iter().next().expect("background recorded");
        assert_eq!(background.bounds(), Rect::new(0.0, 0.0, 30.0, 30.0));
        assert_eq!(first.snapshot.len(), 3);

        let moved = scene.frame(SIZE, &tree(picture(40.0, 40.0, 10.0, 10.0, 2)));
        assert_eq!(moved.damage(), PixelRect::new(0, 0, 50, 50));
    }

    #[test]
    fn clip_culls_and_transform_maps_children() {
        let mut scene = Scene::new();
        let group = ContainerLayer::new(vec![
            picture(0.0, 0.0, 10.0, 10.0, 1),
            picture(50.0, 50.0, 10.0, 10.0, 2),
        ])
        .with_transform(Affine::translate((20.0, 30.0)))
        .with_clip(Rect::new(0.0, 0.0, 20.0, 20.0));
        let result = scene.frame(SIZE, &root(vec![SceneNode::container(group)]));

        assert_eq!(result.snapshot.len(), 1, "clipped child contributes nothing");
        let c = result.snapshot.iter().next().expect("one contribution");
        assert_eq!(c.bounds(), Rect::new(20.0, 30.0, 30.0, 40.0));
        assert_eq!(c.mutators().as_slice(), &[Mutator::ClipRect(Rect::new(0.0, 0.0, 20.0, 20.0))]);
    }

    #[test]
    fn opacity_change_damages_children() {
        let mut scene = Scene::new();
        let child = picture(10.0, 10.0, 10.0, 10.0, 1);
        let tree = |alpha| {
            root(vec![SceneNode::container(
                ContainerLayer::new(vec![child.clone()]).with_opacity(alpha),
            )])
        };
        scene.frame(SIZE, &tree(200));
        assert!(scene.frame(SIZE, &tree(200)).area.is_empty());
        assert_eq!(scene.frame(SIZE, &tree(100)).damage(), PixelRect::new(10, 10, 20, 20));
    }

    #[test]
    fn group_blur_spreads_child_damage() {
        let mut scene = Scene::new();
        let tree = |key| {
            root(vec![SceneNode::container(
                ContainerLayer::new(vec![picture(10.0, 10.0, 10.0, 10.0, key)])
                    .with_blur(BlurFilter::new(2.0)),
            )])
        };
        let first = scene.frame(SIZE, &tree(1));
        let c = first.snapshot.iter().next().expect("one contribution");
        assert_eq!(c.bounds(), Rect::new(4.0, 4.0, 26.0, 26.0));

        assert_eq!(scene.frame(SIZE, &tree(2)).damage(), PixelRect::new(4, 4, 26, 26));
    }

    /// Background picture, then a clipped backdrop with a child on top.
    fn backdrop_tree(below: u64, above: u64) -> SceneNode {
        root(vec![
            picture(20.0, 20.0, 10.0, 10.0, below),
            picture(80.0, 80.0, 10.0, 10.0, 5),
            SceneNode::container(
                ContainerLayer::new(vec![SceneNode::backdrop(BackdropFilterLayer::new(
                    BlurFilter::new(1.0),
                    vec![picture(30.0, 30.0, 5.0, 5.0, above)],
                ))])
                .with_clip(Rect::new(10.0, 10.0, 60.0, 60.0)),
            ),
        ])
    }

    fn backdrop_paint(scene: &Scene) -> BackdropPaint {
        scene.backdrops()[0].paint_mode()
    }

    #[test]
    fn damage_below_a_backdrop_damages_its_readback() {
        let mut scene = Scene::new();
        scene.frame(SIZE, &backdrop_tree(1, 2));
        let result = scene.frame(SIZE, &backdrop_tree(9, 2));
        // Readback is the clip grown by three sigma.
        assert_eq!(result.damage(), PixelRect::new(7, 7, 63, 63));
        assert!(result.stats.converged);
        assert_eq!(result.stats.delegate_passes, 2);
    }

    #[test]
    fn damage_outside_the_readback_is_left_alone() {
        let mut scene = Scene::new();
        let tree = |key| {
            root(vec![
                picture(80.0, 80.0, 10.0, 10.0, key),
                SceneNode::container(
                    ContainerLayer::new(vec![SceneNode::backdrop(BackdropFilterLayer::new(
                        BlurFilter::new(1.0),
                        Vec::new(),
                    ))])
                    .with_clip(Rect::new(10.0, 10.0, 60.0, 60.0)),
                ),
            ])
        };
        scene.frame(SIZE, &tree(1));
        assert_eq!(scene.frame(SIZE, &tree(2)).damage(), PixelRect::new(80, 80, 90, 90));
    }

    #[test]
    fn quiet_backdrop_requests_and_keeps_a_snapshot() {
        let mut scene = Scene::new();
        let tree = backdrop_tree(1, 2);

        scene.frame(SIZE, &tree);
        assert_eq!(backdrop_paint(&scene), BackdropPaint::Filter);
        // Frame n (n >= 2) leaves n - 1 unchanged frames behind it.
        for _ in 2..=SNAPSHOT_THRESHOLD + 1 {
            scene.frame(SIZE, &tree);
            assert_eq!(backdrop_paint(&scene), BackdropPaint::Filter);
        }
        scene.frame(SIZE, &tree);
        assert_eq!(backdrop_paint(&scene), BackdropPaint::CaptureSnapshot);

        let mut release = ReleaseQueue::new();
        scene.backdrops()[0].store_snapshot(ResourceKey(77), &mut release);
        assert!(release.is_empty());

        // Changing what is above the backdrop keeps the snapshot.
        scene.frame(SIZE, &backdrop_tree(1, 3));
        assert_eq!(backdrop_paint(&scene), BackdropPaint::Snapshot(ResourceKey(77)));
        assert!(scene.release_queue().is_empty());

        let result = scene.frame(SIZE, &backdrop_tree(4, 3));
        assert_eq!(result.damage(), PixelRect::new(7, 7, 63, 63));
        assert_eq!(backdrop_paint(&scene), BackdropPaint::Filter);
        assert_eq!(scene.release_queue().pending(), &[ResourceKey(77)]);
    }

    #[test]
    fn identical_backdrops_keep_separate_snapshots() {
        let mut scene = Scene::new();
        let tree = || {
            let glass =
                || SceneNode::backdrop(BackdropFilterLayer::new(BlurFilter::new(2.0), Vec::new()));
            root(vec![picture(10.0, 10.0, 20.0, 20.0, 1), glass(), glass()])
        };
        scene.frame(SIZE, &tree());
        scene.frame(SIZE, &tree());
        let caches: Vec<SharedBackdropCache> =
            scene.backdrops().iter().filter_map(|b| b.cache()).collect();
        let [a, b] = caches.as_slice() else {
            panic!("expected two backdrop caches");
        };
        assert!(!Rc::ptr_eq(a, b), "identical backdrops share a cache");

        let backdrops = scene.backdrops().to_vec();
        let mut release = ReleaseQueue::new();
        backdrops[0].store_snapshot(ResourceKey(1001), &mut release);
        backdrops[1].store_snapshot(ResourceKey(1002), &mut release);
        assert!(release.is_empty());

        scene.frame(SIZE, &tree());
        let paints: Vec<_> = scene.backdrops().iter().map(|b| b.paint_mode()).collect();
        assert_eq!(
            paints,
            [
                BackdropPaint::Snapshot(ResourceKey(1001)),
                BackdropPaint::Snapshot(ResourceKey(1002)),
            ]
        );
        assert!(scene.release_queue().is_empty());
    }

    #[test]
    fn removed_backdrop_releases_its_snapshot() {
        let mut scene = Scene::new();
        let tree = backdrop_tree(1, 2);
        scene.frame(SIZE, &tree);
        scene.backdrops()[0].store_snapshot(ResourceKey(5), &mut ReleaseQueue::new());
        scene.frame(SIZE, &tree);
        assert_eq!(backdrop_paint(&scene), BackdropPaint::Snapshot(ResourceKey(5)));

        scene.frame(SIZE, &root(vec![picture(20.0, 20.0, 10.0, 10.0, 1)]));
        assert!(scene.backdrops().is_empty());
        let drained: Vec<_> = scene.release_queue().drain().collect();
        assert_eq!(drained, [ResourceKey(5)]);
    }

    #[test]
    fn invalidate_forces_full_damage() {
        let mut scene = Scene::new();
        let tree = root(vec![picture(10.0, 10.0, 5.0, 5.0, 1)]);
        scene.frame(SIZE, &tree);
        scene.invalidate();
        let result = scene.frame(SIZE, &tree);
        assert!(result.full);
        assert_eq!(result.damage(), SIZE.bounds());
    }

    #[test]
    fn resizing_forces_full_damage() {
        let mut scene = Scene::new();
        let tree = root(vec![picture(10.0, 10.0, 5.0, 5.0, 1)]);
        scene.frame(SIZE, &tree);
        let result = scene.frame(OutputSize::new(120, 80), &tree);
        assert!(result.full);
        assert_eq!(result.damage(), PixelRect::new(0, 0, 120, 80));
    }
}
