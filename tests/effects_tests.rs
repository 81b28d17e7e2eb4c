//! LocalEffectExecutor integration tests

#[cfg(test)]
mod tests {
    use parking_lot::RwLock;
    use std::sync::Arc;
    use std::time::Duration;
    use tripwire::effects::{EffectOutcome, LocalEffectExecutor};
    use tripwire::host::{Host, TweenTarget};
    use tripwire::memory::{MemoryPeer, MemoryWorld, RecordingRenderer, RenderOp};
    use tripwire::protocol::TriggerEvent;
    use tripwire::settings::{EffectConfig, TripwireSettings};
    use tripwire::types::{Footprint, Point, Rect, Role};
    use tripwire::zone::{self, ReactionType, Zone};
    use tripwire::TripwireError;
    use tokio_test::{assert_err, assert_ok};

    const SCENE: &str = "scene-a";
    const OTHER: &str = "scene-b";
    const GRID: f32 = 50.0;

    fn make_world(zone: Zone) -> Arc<MemoryWorld> {
        let world = MemoryWorld::new();
        world.add_scene(SCENE, GRID);
        world.add_scene(OTHER, 100.0);
        world.add_zone(SCENE, zone).unwrap();
        world
    }

    fn question_zone() -> Zone {
        Zone::new("z1", Rect::new(0.0, 0.0, 100.0, 100.0), ReactionType::Question)
    }

    fn make_executor(
        role: Role,
        peer: &MemoryPeer,
        settings: TripwireSettings,
    ) -> LocalEffectExecutor {
        LocalEffectExecutor::new(
            role,
            peer.collaborators(),
            Arc::new(RwLock::new(settings)),
            EffectConfig::default(),
        )
    }

    fn event(reaction: ReactionType) -> TriggerEvent {
        TriggerEvent {
            entity_id: "tok1".into(),
            zone_id: "z1".into(),
            scene_id: SCENE.into(),
            position: Point::new(50.0, 50.0),
            reaction_type: reaction,
            footprint: Footprint::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Follower peers
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn follower_pans_and_plays_reaction() {
        let world = make_world(question_zone());
        let peer = MemoryPeer::new(world.clone(), Some(SCENE));
        let executor = make_executor(Role::Follower, &peer, TripwireSettings::default());

        let outcome = assert_ok!(
            executor
                .on_trigger_event(&event(ReactionType::Question))
                .await
        );

        assert_eq!(outcome, EffectOutcome::Applied);
        assert_eq!(executor.applied_count(), 1);
        assert_eq!(peer.renderer.pans(), vec![Point::new(50.0, 50.0)]);
        assert_eq!(peer.renderer.glyphs(), vec!["?".to_string()]);
        assert_eq!(peer.renderer.removed_count(), 1);
        assert_eq!(
            peer.sound.played(),
            vec![("modules/tripwire/sounds/reaction2.mp3".to_string(), 0.5)]
        );
    }

    #[tokio::test]
    async fn follower_leaves_durable_state_alone() {
        let world = make_world(question_zone().with_script("m1"));
        let peer = MemoryPeer::new(world.clone(), Some(SCENE));
        let script = peer.scripts.register("m1");
        let executor = make_executor(Role::Follower, &peer, TripwireSettings::default());

        executor
            .on_trigger_event(&event(ReactionType::Question))
            .await
            .unwrap();

        assert!(!world.is_paused());
        assert_eq!(world.commit_count("z1"), 0);
        assert_eq!(script.runs(), 0);
    }

    #[tokio::test]
    async fn follower_elsewhere_is_left_alone() {
        let world = make_world(question_zone());
        let peer = MemoryPeer::new(world.clone(), Some(OTHER));
        let executor = make_executor(Role::Follower, &peer, TripwireSettings::default());

        let outcome = executor
            .on_trigger_event(&event(ReactionType::Question))
            .await
            .unwrap();

        assert_eq!(outcome, EffectOutcome::Ignored);
        assert_eq!(executor.applied_count(), 0);
        assert!(peer.renderer.ops().is_empty());
        assert_eq!(peer.host.viewed_scene().as_deref(), Some(OTHER));
    }

    #[tokio::test]
    async fn warp_setting_pulls_follower_into_scene() {
        let world = make_world(question_zone());
        let peer = MemoryPeer::new(world.clone(), Some(OTHER));
        let settings = TripwireSettings {
            allow_cross_scene_warp: true,
            ..TripwireSettings::default()
        };
        let executor = make_executor(Role::Follower, &peer, settings);

        let outcome = executor
            .on_trigger_event(&event(ReactionType::Question))
            .await
            .unwrap();

        assert_eq!(outcome, EffectOutcome::Applied);
        assert_eq!(peer.host.viewed_scene().as_deref(), Some(SCENE));
        assert_eq!(peer.renderer.pans(), vec![Point::new(50.0, 50.0)]);
    }

    // -----------------------------------------------------------------------
    // Authoritative peer
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn authoritative_pauses_commits_and_runs_script() {
        let world = make_world(question_zone().with_script("m1"));
        let peer = MemoryPeer::new(world.clone(), Some(SCENE));
        let script = peer.scripts.register("m1");
        let executor = make_executor(Role::Authoritative, &peer, TripwireSettings::default());

        executor
            .on_trigger_event(&event(ReactionType::Question))
            .await
            .unwrap();

        assert!(world.is_paused());
        assert!(zone::is_fired(&world.zone(SCENE, "z1").unwrap()));
        assert_eq!(world.commit_count("z1"), 1);
        assert_eq!(script.runs(), 1);
    }

    #[tokio::test]
    async fn authoritative_always_switches_scene() {
        let world = make_world(question_zone());
        let peer = MemoryPeer::new(world.clone(), Some(OTHER));
        let executor = make_executor(Role::Authoritative, &peer, TripwireSettings::default());

        let outcome = executor
            .on_trigger_event(&event(ReactionType::Question))
            .await
            .unwrap();

        assert_eq!(outcome, EffectOutcome::Applied);
        assert_eq!(peer.host.viewed_scene().as_deref(), Some(SCENE));
    }

    #[tokio::test]
    async fn already_fired_zone_is_not_recommitted() {
        let mut fired = question_zone();
        zone::mark_fired(&mut fired);
        let world = make_world(fired);
        let peer = MemoryPeer::new(world.clone(), Some(SCENE));
        let executor = make_executor(Role::Authoritative, &peer, TripwireSettings::default());

        executor
            .on_trigger_event(&event(ReactionType::Question))
            .await
            .unwrap();

        assert_eq!(world.commit_count("z1"), 0);
        assert_eq!(peer.renderer.pans().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_delivery_replays_effects_only() {
        let world = make_world(question_zone().with_script("m1"));
        let peer = MemoryPeer::new(world.clone(), Some(SCENE));
        let script = peer.scripts.register("m1");
        let executor = make_executor(Role::Authoritative, &peer, TripwireSettings::default());
        let ev = event(ReactionType::Question);

        executor.on_trigger_event(&ev).await.unwrap();
        executor.on_trigger_event(&ev).await.unwrap();

        assert_eq!(world.commit_count("z1"), 1);
        assert_eq!(peer.renderer.pans().len(), 2);
        assert_eq!(peer.renderer.glyphs().len(), 2);
        assert_eq!(script.runs(), 2);
        assert_eq!(executor.applied_count(), 2);
    }

    #[tokio::test]
    async fn missing_script_notifies_and_continues() {
        let world = make_world(question_zone().with_script("gone"));
        let peer = MemoryPeer::new(world.clone(), Some(SCENE));
        let executor = make_executor(Role::Authoritative, &peer, TripwireSettings::default());

        let outcome = executor
            .on_trigger_event(&event(ReactionType::Question))
            .await
            .unwrap();

        assert_eq!(outcome, EffectOutcome::Applied);
        assert_eq!(
            peer.notifier.errors(),
            vec!["The script triggered by the tripwire zone no longer exists.".to_string()]
        );
        assert_eq!(peer.renderer.pans().len(), 1);
    }

    #[tokio::test]
    async fn removed_script_is_reported() {
        let world = make_world(question_zone().with_script("m1"));
        let peer = MemoryPeer::new(world.clone(), Some(SCENE));
        let script = peer.scripts.register("m1");
        peer.scripts.remove("m1");
        let executor = make_executor(Role::Authoritative, &peer, TripwireSettings::default());

        executor
            .on_trigger_event(&event(ReactionType::Question))
            .await
            .unwrap();

        assert_eq!(script.runs(), 0);
        assert_eq!(peer.notifier.errors().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Presentation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn none_reaction_only_pans() {
        let world = make_world(question_zone());
        let peer = MemoryPeer::new(world.clone(), Some(SCENE));
        let executor = make_executor(Role::Follower, &peer, TripwireSettings::default());

        executor
            .on_trigger_event(&event(ReactionType::None))
            .await
            .unwrap();

        assert_eq!(peer.renderer.pans().len(), 1);
        assert!(peer.renderer.glyphs().is_empty());
        assert!(peer.sound.played().is_empty());
    }

    #[tokio::test]
    async fn disabled_sfx_keeps_glyph() {
        let world = make_world(question_zone());
        let peer = MemoryPeer::new(world.clone(), Some(SCENE));
        let settings = TripwireSettings {
            disable_sfx: true,
            ..TripwireSettings::default()
        };
        let executor = make_executor(Role::Follower, &peer, settings);

        executor
            .on_trigger_event(&event(ReactionType::Exclamation))
            .await
            .unwrap();

        assert_eq!(peer.renderer.glyphs(), vec!["!".to_string()]);
        assert!(peer.sound.played().is_empty());
    }

    #[tokio::test]
    async fn glyph_runs_full_stage_sequence() {
        let world = make_world(question_zone());
        let peer = MemoryPeer::new(world.clone(), Some(SCENE));
        let executor = make_executor(Role::Follower, &peer, TripwireSettings::default());

        executor
            .on_trigger_event(&event(ReactionType::Info))
            .await
            .unwrap();

        let glyph_ops: Vec<RenderOp> = peer
            .renderer
            .ops()
            .into_iter()
            .filter(|op| !matches!(op, RenderOp::Pan { .. }))
            .collect();
        assert_eq!(glyph_ops.len(), 8, "add + 6 tweens + remove");

        match &glyph_ops[0] {
            RenderOp::AddGlyph { layer, glyph, .. } => {
                assert_eq!(layer, "foreground");
                assert_eq!(glyph.text, "ⓘ");
                assert_eq!(glyph.font_size, 30.0);
                assert_eq!(glyph.position, Point::new(75.0, 75.0));
                assert_eq!(glyph.alpha, 0.0);
            }
            other => panic!("expected glyph first, got {:?}", other),
        }

        assert_eq!(
            glyph_ops[1],
            RenderOp::Tween {
                element: 1,
                target: TweenTarget {
                    position: Some(Point::new(75.0, 62.5)),
                    alpha: Some(1.0),
                    duration: Duration::from_millis(150),
                },
            }
        );
        assert_eq!(
            glyph_ops[6],
            RenderOp::Tween {
                element: 1,
                target: TweenTarget {
                    position: None,
                    alpha: Some(0.0),
                    duration: Duration::from_millis(2500),
                },
            }
        );
        assert!(matches!(glyph_ops[7], RenderOp::Remove { element: 1, .. }));
    }

    #[tokio::test]
    async fn glyph_is_centred_on_large_footprint() {
        let world = make_world(question_zone());
        let peer = MemoryPeer::new(world.clone(), Some(SCENE));
        let executor = make_executor(Role::Follower, &peer, TripwireSettings::default());
        let mut ev = event(ReactionType::Question);
        ev.footprint = Footprint::new(2.0, 2.0);

        executor.on_trigger_event(&ev).await.unwrap();

        let anchor = peer.renderer.ops().into_iter().find_map(|op| match op {
            RenderOp::AddGlyph { glyph, .. } => Some(glyph.position),
            _ => None,
        });
        assert_eq!(anchor, Some(Point::new(100.0, 100.0)));
        assert_eq!(peer.renderer.pans(), vec![Point::new(50.0, 50.0)]);
    }

    #[tokio::test]
    async fn pan_never_zooms_out() {
        let world = make_world(question_zone());
        for (current, expected) in [(0.5, 1.0), (2.0, 2.0)] {
            let peer = MemoryPeer::new(world.clone(), Some(SCENE));
            let renderer = Arc::new(RecordingRenderer::with_scale(current));
            let mut collaborators = peer.collaborators();
            collaborators.renderer = renderer.clone();
            let executor = LocalEffectExecutor::new(
                Role::Follower,
                collaborators,
                Arc::new(RwLock::new(TripwireSettings::default())),
                EffectConfig::default(),
            );

            executor
                .on_trigger_event(&event(ReactionType::None))
                .await
                .unwrap();

            match renderer.ops().as_slice() {
                [RenderOp::Pan {
                    scale, duration, ..
                }] => {
                    assert_eq!(*scale, expected);
                    assert_eq!(*duration, Duration::from_millis(250));
                }
                other => panic!("expected a single pan, got {:?}", other),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Failures
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn missing_zone_still_pans() {
        let world = make_world(question_zone());
        let peer = MemoryPeer::new(world.clone(), Some(SCENE));
        let executor = make_executor(Role::Authoritative, &peer, TripwireSettings::default());
        let mut ev = event(ReactionType::Question);
        ev.zone_id = "deleted".into();

        let outcome = executor.on_trigger_event(&ev).await.unwrap();

        assert_eq!(outcome, EffectOutcome::Applied);
        assert_eq!(peer.renderer.pans().len(), 1);
        assert_eq!(world.commit_count("z1"), 0);
    }

    #[tokio::test]
    async fn missing_scene_is_an_error() {
        let world = make_world(question_zone());
        let peer = MemoryPeer::new(world.clone(), Some("ghost"));
        let executor = make_executor(Role::Follower, &peer, TripwireSettings::default());
        let mut ev = event(ReactionType::Question);
        ev.scene_id = "ghost".into();

        let err = assert_err!(executor.on_trigger_event(&ev).await);

        assert!(matches!(err, TripwireError::SceneNotFound(ref s) if s == "ghost"));
        assert_eq!(executor.applied_count(), 0);
    }
}
