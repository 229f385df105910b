// Optional DockerRepo tests when Docker daemon is available

use optilink::docker_repo::DockerRepo;
use optilink::models::HubMessage;
use optilink::watchdog::{ContainerRuntime, Watchdog};
use std::sync::Arc;
use tokio::sync::broadcast;

#[tokio::test]
async fn docker_repo_connect_and_list_all() {
    let repo = match DockerRepo::connect() {
        Ok(r) => r,
        Err(_) => return, // Skip when Docker is not available (e.g. CI without Docker)
    };
    // The daemon may still be unreachable behind a valid socket path.
    let Ok(containers) = repo.list_all().await else {
        return;
    };
    assert!(containers.iter().all(|c| !c.name.starts_with('/')));
}

#[tokio::test]
async fn watchdog_cycle_against_live_daemon_publishes_inventory() {
    let repo = match DockerRepo::connect() {
        Ok(r) => Arc::new(r),
        Err(_) => return,
    };
    let (tx, mut rx) = broadcast::channel(16);
    // A target no real container carries, so nothing gets restarted.
    let watchdog = Watchdog::new(repo, tx, "optilink-test-no-such-container");
    let Ok(inventory) = watchdog.run_cycle().await else {
        return;
    };
    match rx.try_recv().unwrap() {
        HubMessage::Containers(published) => assert_eq!(published, inventory),
        other => panic!("expected containers, got {:?}", other),
    }
}
