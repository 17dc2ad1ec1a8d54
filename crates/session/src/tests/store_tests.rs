use super::*;
use shared::domain::{Edge, EdgeId, SubstationConnection};

fn editing_store(points: &[(f64, f64)]) -> NetworkStore {
    let mut store = NetworkStore::new();
    store.set_editing(true);
    for (lat, lng) in points {
        store.add_house(GeoPoint::new(*lat, *lng)).expect("add house");
    }
    store
}

fn chain_layout(store: &NetworkStore) -> PrimaryLayout {
    let houses = store.houses();
    let edges: Vec<Edge> = houses
        .windows(2)
        .map(|pair| Edge::between(pair[0].location, pair[1].location))
        .collect();
    let substation = GeoPoint::new(30.3572, 78.0789);
    let link = houses[0].location.haversine_m(&substation);
    let total_length = edges.iter().map(|edge| edge.distance).sum::<f64>() + link;
    PrimaryLayout {
        edges,
        substation_connection: SubstationConnection {
            house: houses[0].location,
            substation,
            distance: link,
            substation_name: None,
        },
        total_length,
        total_cost: total_length * 500.0,
        cost_per_meter: 500.0,
        house_count: houses.len(),
    }
}

fn backup_for(failed: FailedEdge, total_cost: f64) -> BackupLayout {
    BackupLayout {
        edges: vec![failed.edge],
        total_length: total_cost / 500.0,
        total_cost,
        failed,
    }
}

fn first_edge(layout: &PrimaryLayout) -> FailedEdge {
    FailedEdge {
        id: EdgeId(0),
        edge: layout.edges[0],
    }
}

#[test]
fn houses_get_sequential_one_based_ids() {
    let store = editing_store(&[(30.10, 78.10), (30.11, 78.10), (30.12, 78.11)]);
    let ids: Vec<u32> = store.houses().iter().map(|house| house.id.0).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(store.revision(), 3);
}

#[test]
fn adding_outside_edit_mode_is_rejected() {
    let mut store = NetworkStore::new();
    let err = store
        .add_house(GeoPoint::new(30.1, 78.1))
        .expect_err("not editing");
    assert!(matches!(err, SessionError::InvalidInput(_)));
    assert!(store.is_empty());
}

#[test]
fn out_of_range_coordinates_are_rejected() {
    let mut store = editing_store(&[]);
    assert!(store.add_house(GeoPoint::new(95.0, 78.1)).is_err());
    assert!(store.is_empty());
}

#[test]
fn accepting_primary_checks_the_house_set() {
    let mut store = editing_store(&[(30.10, 78.10), (30.11, 78.10)]);
    let layout = chain_layout(&store);
    let revision = store.revision();

    store.add_house(GeoPoint::new(30.12, 78.11)).expect("third house");
    let err = store
        .accept_primary_layout(layout.clone(), revision)
        .expect_err("stale revision");
    assert!(matches!(err, SessionError::Invariant(_)));

    let mut wrong_count = chain_layout(&store);
    wrong_count.house_count = 2;
    assert!(store
        .accept_primary_layout(wrong_count, store.revision())
        .is_err());

    store
        .accept_primary_layout(chain_layout(&store), store.revision())
        .expect("fresh layout");
    assert!(store.check_invariants().is_ok());
}

#[test]
fn moving_a_house_discards_the_layout() {
    let mut store = editing_store(&[(30.10, 78.10), (30.11, 78.10)]);
    store
        .accept_primary_layout(chain_layout(&store), store.revision())
        .expect("layout");

    let outcome = store
        .move_house(HouseId(2), GeoPoint::new(30.115, 78.105))
        .expect("move");
    assert!(outcome.layout_discarded);
    assert_eq!(outcome.house.location, GeoPoint::new(30.115, 78.105));
    assert!(store.primary().is_none());

    let again = store
        .move_house(HouseId(1), GeoPoint::new(30.101, 78.101))
        .expect("move without layout");
    assert!(!again.layout_discarded);
}

#[test]
fn moving_an_unknown_house_fails() {
    let mut store = editing_store(&[(30.10, 78.10)]);
    let err = store
        .move_house(HouseId(7), GeoPoint::new(30.1, 78.1))
        .expect_err("unknown");
    assert_eq!(err, SessionError::UnknownHouse(HouseId(7)));
}

#[test]
fn backup_requires_the_matching_failed_edge() {
    let mut store = editing_store(&[(30.10, 78.10), (30.11, 78.10), (30.12, 78.11)]);
    let layout = chain_layout(&store);
    store
        .accept_primary_layout(layout.clone(), store.revision())
        .expect("layout");

    let failed = first_edge(&layout);
    assert!(store
        .accept_backup_layout(backup_for(failed, 1.0))
        .is_err());

    store.mark_failed(failed).expect("mark failed");
    let other = FailedEdge {
        id: EdgeId(1),
        edge: layout.edges[1],
    };
    assert!(store.accept_backup_layout(backup_for(other, 1.0)).is_err());

    store
        .accept_backup_layout(backup_for(failed, layout.total_cost * 1.1))
        .expect("backup");
    assert!(store.check_invariants().is_ok());
    assert!(store.backup().is_some());
}

#[test]
fn marking_another_edge_drops_the_previous_backup() {
    let mut store = editing_store(&[(30.10, 78.10), (30.11, 78.10), (30.12, 78.11)]);
    let layout = chain_layout(&store);
    store
        .accept_primary_layout(layout.clone(), store.revision())
        .expect("layout");
    let failed = first_edge(&layout);
    store.mark_failed(failed).expect("mark");
    store
        .accept_backup_layout(backup_for(failed, 10.0))
        .expect("backup");

    store
        .mark_failed(FailedEdge {
            id: EdgeId(1),
            edge: layout.edges[1],
        })
        .expect("second failure");
    assert!(store.backup().is_none());
    assert_eq!(store.failed().map(|failed| failed.id), Some(EdgeId(1)));
}

#[test]
fn failed_edge_must_belong_to_the_layout() {
    let mut store = editing_store(&[(30.10, 78.10), (30.11, 78.10)]);
    let layout = chain_layout(&store);
    assert!(store.mark_failed(first_edge(&layout)).is_err());

    store
        .accept_primary_layout(layout.clone(), store.revision())
        .expect("layout");
    let bogus = FailedEdge {
        id: EdgeId(5),
        edge: layout.edges[0],
    };
    assert!(matches!(
        store.mark_failed(bogus),
        Err(SessionError::Invariant(_))
    ));
}

#[test]
fn new_primary_layout_clears_failure_state() {
    let mut store = editing_store(&[(30.10, 78.10), (30.11, 78.10)]);
    let layout = chain_layout(&store);
    store
        .accept_primary_layout(layout.clone(), store.revision())
        .expect("layout");
    store.mark_failed(first_edge(&layout)).expect("mark");

    store
        .accept_primary_layout(layout, store.revision())
        .expect("replacement");
    assert!(store.failed().is_none());
    assert!(store.backup().is_none());
}

#[test]
fn reset_twice_equals_reset_once() {
    let mut store = editing_store(&[(30.10, 78.10), (30.11, 78.10)]);
    let layout = chain_layout(&store);
    store
        .accept_primary_layout(layout.clone(), store.revision())
        .expect("layout");
    store.mark_failed(first_edge(&layout)).expect("mark");

    store.reset();
    let once = store.clone();
    store.reset();
    assert_eq!(store, once);
    assert_eq!(store, NetworkStore::new());
    assert!(!store.is_editing());
}
