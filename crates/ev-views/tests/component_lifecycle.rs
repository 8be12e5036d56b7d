mod common;

use std::time::Duration;

use common::{fixture, progress, select, settle, window_resized};
use ev_core::{names, ProjectId};
use ev_data::{FetchError, MemorySource, VisualizationKind};
use ev_views::{ComponentOptions, ComponentState, LoadOutcome, Surface};
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_donut_renders_loaded_percentage() {
    // Arrange
    let source = MemorySource::new().with_payload(
        VisualizationKind::Donut,
        ProjectId(42),
        progress(73.0, 146.0, 200.0),
    );
    let f = fixture(source);
    let mount = Surface::mount(300.0, 300.0);

    // Act
    let donut = f
        .registry
        .create("donut", mount.clone(), ComponentOptions::default().with_project(ProjectId(42)))
        .unwrap();
    settle().await;

    // Assert
    let status = donut.status();
    assert_eq!(status.state, ComponentState::Ready);
    assert_eq!(status.data, progress(73.0, 146.0, 200.0));
    assert_eq!(status.bound_project, Some(ProjectId(42)));
    assert!(mount.contains_text("73%"));
    assert!(mount.contains_text("Complete"));
    assert!(!mount.is_loading());
    assert_eq!(mount.error_message(), None);
}

#[tokio::test(start_paused = true)]
async fn test_selection_event_triggers_load() {
    // Arrange
    let source = MemorySource::new()
        .with_payload(VisualizationKind::Donut, ProjectId(7), progress(10.0, 10.0, 100.0));
    let f = fixture(source);
    let mount = Surface::mount(300.0, 300.0);
    let donut = f.registry.create("donut", mount.clone(), ComponentOptions::default()).unwrap();
    assert_eq!(donut.state(), ComponentState::Uninitialized);

    // Act
    select(&f.bus, 7);
    settle().await;

    // Assert
    assert_eq!(donut.state(), ComponentState::Ready);
    assert!(mount.contains_text("10%"));
    assert_eq!(f.source.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_loading_affordance_while_fetching() {
    // Arrange
    let source = MemorySource::new()
        .with_payload(VisualizationKind::Donut, ProjectId(1), progress(50.0, 50.0, 100.0))
        .with_delay(VisualizationKind::Donut, ProjectId(1), Duration::from_millis(100));
    let f = fixture(source);
    let mount = Surface::mount(300.0, 300.0);
    let donut = f.registry.create("donut", mount.clone(), ComponentOptions::default()).unwrap();

    // Act
    select(&f.bus, 1);
    sleep(Duration::from_millis(10)).await;

    // Assert
    assert_eq!(donut.state(), ComponentState::Loading);
    assert!(mount.is_loading());

    sleep(Duration::from_millis(100)).await;
    assert_eq!(donut.state(), ComponentState::Ready);
    assert!(!mount.is_loading());
}

#[tokio::test(start_paused = true)]
async fn test_server_error_shows_message_and_zero_data() {
    // Arrange
    let source = MemorySource::new()
        .with_payload(VisualizationKind::Donut, ProjectId(1), progress(73.0, 146.0, 200.0))
        .with_failure(VisualizationKind::Donut, ProjectId(2), FetchError::Status(500));
    let f = fixture(source);
    let mount = Surface::mount(300.0, 300.0);
    let donut = f.registry.create("donut", mount.clone(), ComponentOptions::default()).unwrap();
    assert_eq!(donut.load_data(ProjectId(1)).await, LoadOutcome::Ready);

    // Act
    let outcome = donut.load_data(ProjectId(2)).await;

    // Assert
    let message = "Failed to load data: API request failed with status 500".to_string();
    assert_eq!(outcome, LoadOutcome::Error(message.clone()));

    let status = donut.status();
    assert_eq!(status.state, ComponentState::Error);
    assert!(status.data.is_zero());
    assert_eq!(status.last_error, Some(message.clone()));
    assert_eq!(mount.error_message(), Some(message));
    assert!(mount.contains_text("0%"));
    assert!(!mount.is_loading());
}

#[tokio::test(start_paused = true)]
async fn test_successful_reload_clears_error() {
    // Arrange
    let source = MemorySource::new()
        .with_failure(VisualizationKind::Spi, ProjectId(1), FetchError::Timeout);
    let f = fixture(source);
    let mount = Surface::mount(300.0, 300.0);
    let spi = f.registry.create("spi", mount.clone(), ComponentOptions::default()).unwrap();
    assert!(matches!(spi.load_data(ProjectId(1)).await, LoadOutcome::Error(_)));
    assert!(mount.error_message().is_some());

    // Act
    f.source.set_payload(VisualizationKind::Spi, ProjectId(1), VisualizationKind::Spi.zero_payload());
    let outcome = spi.load_data(ProjectId(1)).await;

    // Assert
    assert_eq!(outcome, LoadOutcome::Ready);
    assert_eq!(spi.status().last_error, None);
    assert_eq!(mount.error_message(), None);
}

#[tokio::test(start_paused = true)]
async fn test_last_call_wins_when_older_resolves_last() {
    // Arrange
    let source = MemorySource::new()
        .with_payload(VisualizationKind::Donut, ProjectId(1), progress(11.0, 11.0, 100.0))
        .with_payload(VisualizationKind::Donut, ProjectId(2), progress(22.0, 22.0, 100.0))
        .with_delay(VisualizationKind::Donut, ProjectId(1), Duration::from_millis(200))
        .with_delay(VisualizationKind::Donut, ProjectId(2), Duration::from_millis(50));
    let f = fixture(source);
    let mount = Surface::mount(300.0, 300.0);
    let donut = f.registry.create("donut", mount.clone(), ComponentOptions::default()).unwrap();

    // Act
    let (first, second) = tokio::join!(donut.load_data(ProjectId(1)), donut.load_data(ProjectId(2)));

    // Assert
    assert_eq!(first, LoadOutcome::Stale);
    assert_eq!(second, LoadOutcome::Ready);
    assert_eq!(donut.status().data, progress(22.0, 22.0, 100.0));
    assert_eq!(donut.status().bound_project, Some(ProjectId(2)));
    assert!(mount.contains_text("22%"));
    assert!(!mount.contains_text("11%"));
}

#[tokio::test(start_paused = true)]
async fn test_last_call_wins_when_older_resolves_first() {
    // Arrange
    let source = MemorySource::new()
        .with_payload(VisualizationKind::Donut, ProjectId(1), progress(11.0, 11.0, 100.0))
        .with_payload(VisualizationKind::Donut, ProjectId(2), progress(22.0, 22.0, 100.0))
        .with_delay(VisualizationKind::Donut, ProjectId(1), Duration::from_millis(50))
        .with_delay(VisualizationKind::Donut, ProjectId(2), Duration::from_millis(200));
    let f = fixture(source);
    let mount = Surface::mount(300.0, 300.0);
    let donut = f.registry.create("donut", mount.clone(), ComponentOptions::default()).unwrap();

    // Act
    let (first, second) = tokio::join!(donut.load_data(ProjectId(1)), donut.load_data(ProjectId(2)));

    // Assert
    assert_eq!(first, LoadOutcome::Stale);
    assert_eq!(second, LoadOutcome::Ready);
    assert_eq!(donut.status().data, progress(22.0, 22.0, 100.0));
    assert!(mount.contains_text("22%"));
}

#[tokio::test(start_paused = true)]
async fn test_stale_failure_does_not_surface() {
    // Arrange
    let source = MemorySource::new()
        .with_failure(VisualizationKind::Donut, ProjectId(1), FetchError::Status(500))
        .with_payload(VisualizationKind::Donut, ProjectId(2), progress(22.0, 22.0, 100.0))
        .with_delay(VisualizationKind::Donut, ProjectId(1), Duration::from_millis(200));
    let f = fixture(source);
    let mount = Surface::mount(300.0, 300.0);
    let donut = f.registry.create("donut", mount.clone(), ComponentOptions::default()).unwrap();

    // Act
    let (first, second) = tokio::join!(donut.load_data(ProjectId(1)), donut.load_data(ProjectId(2)));

    // Assert
    assert_eq!(first, LoadOutcome::Stale);
    assert_eq!(second, LoadOutcome::Ready);
    assert_eq!(donut.state(), ComponentState::Ready);
    assert_eq!(mount.error_message(), None);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_during_fetch_leaves_surface_untouched() {
    // Arrange
    let source = MemorySource::new()
        .with_payload(VisualizationKind::Donut, ProjectId(1), progress(50.0, 50.0, 100.0))
        .with_delay(VisualizationKind::Donut, ProjectId(1), Duration::from_millis(100));
    let f = fixture(source);
    let mount = Surface::mount(300.0, 300.0);
    let donut = f
        .registry
        .create("donut", mount.clone(), ComponentOptions::default().with_id("d"))
        .unwrap();

    let pending = {
        let donut = donut.clone();
        tokio::spawn(async move { donut.load_data(ProjectId(1)).await })
    };
    sleep(Duration::from_millis(10)).await;

    // Act
    donut.destroy();
    let revision = mount.revision();
    let outcome = pending.await.unwrap();

    // Assert
    assert_eq!(outcome, LoadOutcome::Stale);
    assert_eq!(mount.revision(), revision);
    assert_eq!(mount.scene_len(), 0);
    assert!(!mount.is_loading());
    assert!(!donut.is_alive());
    assert!(f.registry.get("d").is_none());
    assert!(f.registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_resize_burst_recomputes_once_after_quiet_window() {
    // Arrange
    let source = MemorySource::new()
        .with_payload(VisualizationKind::Donut, ProjectId(1), progress(73.0, 146.0, 200.0));
    let f = fixture(source);
    let mount = Surface::mount(300.0, 300.0);
    let donut = f.registry.create("donut", mount.clone(), ComponentOptions::default()).unwrap();
    donut.load_data(ProjectId(1)).await;

    // Act
    mount.set_size(120.0, 300.0);
    for _ in 0..10 {
        window_resized(&f.bus, 120.0, 300.0);
        sleep(Duration::from_millis(5)).await;
    }
    // Last event at t=45ms; the recomputation is due at t=295ms
    sleep(Duration::from_millis(240)).await;

    // Assert
    assert_eq!(donut.core().layout_passes(), 0);

    sleep(Duration::from_millis(20)).await;
    assert_eq!(donut.core().layout_passes(), 1);

    sleep(Duration::from_millis(500)).await;
    assert_eq!(donut.core().layout_passes(), 1);
    assert!(mount.contains_text("73%"));
}

#[tokio::test(start_paused = true)]
async fn test_resize_before_first_render_is_ignored() {
    // Arrange
    let f = fixture(MemorySource::new());
    let mount = Surface::mount(300.0, 300.0);
    let donut = f.registry.create("donut", mount.clone(), ComponentOptions::default()).unwrap();

    // Act
    window_resized(&f.bus, 100.0, 100.0);
    sleep(Duration::from_millis(300)).await;

    // Assert
    assert_eq!(donut.core().layout_passes(), 0);
    assert_eq!(mount.scene_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_non_responsive_widget_ignores_resize() {
    // Arrange
    let source = MemorySource::new()
        .with_payload(VisualizationKind::Donut, ProjectId(1), progress(73.0, 146.0, 200.0));
    let f = fixture(source);
    let donut = f
        .registry
        .create("donut", Surface::mount(300.0, 300.0), ComponentOptions::default().with_responsive(false))
        .unwrap();
    donut.load_data(ProjectId(1)).await;

    // Act
    window_resized(&f.bus, 100.0, 100.0);
    sleep(Duration::from_millis(300)).await;

    // Assert
    assert_eq!(f.bus.subscriber_count(names::WINDOW_RESIZED), 0);
    assert_eq!(donut.core().layout_passes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_init_twice_subscribes_once() {
    // Arrange
    let f = fixture(MemorySource::new());
    let donut = f
        .registry
        .create("donut", Surface::mount(300.0, 300.0), ComponentOptions::default())
        .unwrap();

    // Act
    donut.init();
    donut.init();

    // Assert
    assert_eq!(f.bus.subscriber_count(names::SELECTION_CHANGED), 1);
    assert_eq!(f.bus.subscriber_count(names::WINDOW_RESIZED), 1);
    assert_eq!(donut.core().subscription_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failing_subscriber_does_not_block_widgets() {
    // Arrange
    let source = MemorySource::new()
        .with_payload(VisualizationKind::Donut, ProjectId(3), progress(30.0, 30.0, 100.0));
    let f = fixture(source);
    f.bus.subscribe(names::SELECTION_CHANGED, |_| anyhow::bail!("listener broke"));
    f.bus.subscribe(names::SELECTION_CHANGED, |_| panic!("listener panicked"));
    let mount = Surface::mount(300.0, 300.0);
    let donut = f.registry.create("donut", mount.clone(), ComponentOptions::default()).unwrap();

    // Act
    select(&f.bus, 3);
    settle().await;

    // Assert
    assert_eq!(donut.state(), ComponentState::Ready);
    assert!(mount.contains_text("30%"));
}
