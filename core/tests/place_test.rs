//! Place catalog, get-or-create and authentication behaviour of the engine

mod helpers;

use std::{sync::Arc, time::Duration};

use helpers::*;
use mejour_core::{
	Coordinate, Error, ErrorKind, FollowStore, LoginCredentials, NearbyQuery, NewPlace, Place,
	PlaceSource, PlaceType, Session, SyncEngine, Visibility,
};
use mejour_remote_api::{AccessToken, Gateway};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

fn coord(latitude: f64, longitude: f64) -> Coordinate {
	Coordinate::new(latitude, longitude).unwrap()
}

fn remote_ids(places: &[Place]) -> Vec<i64> {
	places.iter().map(|place| place.remote_id).collect()
}

#[tokio::test]
async fn refresh_splits_catalog_into_scopes() {
	let gateway = Arc::new(FakeGateway::new());
	gateway.add_place(place_dto(1, "Home", 25.0, 121.0, ME, Visibility::Private));
	gateway.add_place(place_dto(2, "Office", 25.1, 121.0, ME, Visibility::Public));
	gateway.add_place(place_dto(3, "Park", 25.2, 121.0, 8, Visibility::Public));
	let engine = engine(&gateway);

	assert_eq!(engine.refresh_places().await.unwrap(), 3);

	assert_eq!(remote_ids(&engine.places(PlaceSource::Mine).await), vec![1, 2]);
	assert_eq!(remote_ids(&engine.places(PlaceSource::Community).await), vec![2, 3]);
	assert_eq!(remote_ids(&engine.places(PlaceSource::All).await), vec![1, 2, 3]);
	assert_eq!(gateway.calls("list_places"), 1);
}

#[tokio::test]
async fn near_duplicate_pins_collapse() {
	let gateway = Arc::new(FakeGateway::new());
	gateway.add_place(place_dto(1, "Daily Drip", 25.0330, 121.5654, 8, Visibility::Public));
	gateway.add_place(place_dto(2, "Daily Drip", 25.0331, 121.5655, 9, Visibility::Public));
	let engine = engine(&gateway);

	engine.refresh_places().await.unwrap();

	assert_eq!(remote_ids(&engine.places(PlaceSource::Community).await), vec![1]);
}

#[tokio::test]
async fn unmappable_record_keeps_previous_catalog() {
	let gateway = Arc::new(FakeGateway::new());
	gateway.add_place(place_dto(1, "Park", 25.0, 121.0, 8, Visibility::Public));
	let engine = engine(&gateway);
	engine.refresh_places().await.unwrap();

	let mut broken = place_dto(2, "Broken", 25.0, 121.0, 8, Visibility::Public);
	broken.latitude = "somewhere".to_string();
	gateway.add_place(broken);

	let err = engine.refresh_places().await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::MappingFailure);
	assert_eq!(remote_ids(&engine.places(PlaceSource::All).await), vec![1]);
}

#[tokio::test]
async fn failed_page_keeps_previous_catalog() {
	let gateway = Arc::new(FakeGateway::new());
	gateway.add_place(place_dto(1, "Park", 25.0, 121.0, 8, Visibility::Public));
	let engine = engine(&gateway);
	engine.refresh_places().await.unwrap();

	gateway.fail("list_places", 502);

	assert!(matches!(
		engine.refresh_places().await,
		Err(Error::HttpStatus { code: 502, .. })
	));
	assert_eq!(engine.places(PlaceSource::All).await.len(), 1);
}

#[tokio::test]
async fn creates_when_nothing_is_near() {
	let gateway = Arc::new(FakeGateway::new());
	gateway.add_place(place_dto(1, "Test Cafe", 25.01, 121.0, 8, Visibility::Public));
	let engine = engine(&gateway);
	engine.refresh_places().await.unwrap();

	let mut input = NewPlace::new("Test Cafe", coord(25.0, 121.0));
	input.kind = PlaceType::Cafe;
	input.tags = vec!["wifi".to_string(), "WiFi".to_string()];
	input.visibility = Visibility::Private;

	let place = engine.get_or_create_place(input, 30.0).await.unwrap();

	assert_eq!(gateway.calls("create_place"), 1);
	assert_eq!(place.remote_id, 1001);
	assert!(place.is_persisted());
	assert_eq!(place.kind, PlaceType::Cafe);
	assert_eq!(place.tags, vec!["wifi"]);
	assert_eq!(place.owner_id, Some(user_uuid(ME)));

	let stored = gateway.place(1001);
	assert_eq!(stored.latitude, "25.000000");
	assert_eq!(stored.longitude, "121.000000");

	assert_eq!(engine.place(1001).await, Some(place.clone()));
	assert_eq!(remote_ids(&engine.places(PlaceSource::Mine).await), vec![1001]);
}

#[tokio::test]
#[traced_test]
async fn reuses_same_named_place_within_radius() {
	let gateway = Arc::new(FakeGateway::new());
	gateway.add_place(place_dto(1, "Test Cafe", 25.0002, 121.0, 8, Visibility::Public));
	gateway.add_place(place_dto(2, "test cafe", 25.0001, 121.0, 9, Visibility::Public));
	let engine = engine(&gateway);
	engine.refresh_places().await.unwrap();

	let place = engine
		.get_or_create_place(NewPlace::new("  TEST CAFE ", coord(25.0, 121.0)), 30.0)
		.await
		.unwrap();

	assert_eq!(place.remote_id, 2);
	assert_eq!(gateway.calls("create_place"), 0);
	assert!(logs_contain("Reusing existing place"));
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_create_once() {
	let gateway = Arc::new(FakeGateway::new().with_create_latency(Duration::from_millis(200)));
	let engine = engine(&gateway);

	let (first, second) = tokio::join!(
		engine.get_or_create_place(NewPlace::new("Test Cafe", coord(25.0, 121.0)), 30.0),
		engine.get_or_create_place(NewPlace::new("Test Cafe", coord(25.00005, 121.0)), 30.0),
	);

	assert_eq!(gateway.calls("create_place"), 1);
	assert_eq!(gateway.place_count(), 1);
	assert_eq!(first.unwrap().remote_id, second.unwrap().remote_id);
}

#[tokio::test]
async fn remote_rejection_is_a_creation_failure() {
	let gateway = Arc::new(FakeGateway::new());
	gateway.fail("create_place", 400);
	let engine = engine(&gateway);

	let err = engine
		.get_or_create_place(NewPlace::new("Test Cafe", coord(25.0, 121.0)), 30.0)
		.await
		.unwrap_err();

	match &err {
		Error::PlaceCreationFailed(reason) => assert!(reason.contains("create_place failed")),
		other => panic!("expected a creation failure, got {other:?}"),
	}
	assert!(engine.places(PlaceSource::All).await.is_empty());
}

#[tokio::test]
async fn rejects_blank_names_and_bad_radius() {
	let gateway = Arc::new(FakeGateway::new());
	let engine = engine(&gateway);

	assert!(matches!(
		engine
			.get_or_create_place(NewPlace::new("   ", coord(25.0, 121.0)), 30.0)
			.await,
		Err(Error::InvalidInput(_))
	));
	assert!(matches!(
		engine
			.get_or_create_place(NewPlace::new("Cafe", coord(25.0, 121.0)), f64::NAN)
			.await,
		Err(Error::InvalidInput(_))
	));
	assert_eq!(gateway.calls("create_place"), 0);
}

#[tokio::test]
async fn unauthenticated_without_credentials_fails() {
	let gateway = Arc::new(FakeGateway::new());
	let engine = signed_out_engine(&gateway, None);

	let err = engine
		.get_or_create_place(NewPlace::new("Test Cafe", coord(25.0, 121.0)), 30.0)
		.await
		.unwrap_err();

	assert_eq!(err.kind(), ErrorKind::MissingCredential);
	assert_eq!(gateway.calls("create_place"), 0);
	assert_eq!(gateway.calls("login"), 0);
}

#[tokio::test]
async fn signs_in_silently_once() {
	let gateway = Arc::new(FakeGateway::new());
	gateway.add_place(place_dto(1, "Park", 25.0, 121.0, 8, Visibility::Public));
	let engine = signed_out_engine(&gateway, Some(LoginCredentials::new("ann", "pw")));

	engine.refresh_places().await.unwrap();
	engine.refresh_places().await.unwrap();

	assert_eq!(gateway.calls("login"), 1);
	assert_eq!(engine.current_user().await, Some(me()));
}

#[tokio::test]
async fn failed_silent_sign_in_is_a_missing_credential() {
	let gateway = Arc::new(FakeGateway::new());
	let engine = signed_out_engine(&gateway, Some(LoginCredentials::new("ann", "wrong")));

	assert!(matches!(
		engine.refresh_places().await,
		Err(Error::MissingCredential)
	));
	assert_eq!(gateway.calls("login"), 1);
	assert_eq!(gateway.calls("list_places"), 0);

	// One attempt per operation, never a loop
	assert!(engine.refresh_places().await.is_err());
	assert_eq!(gateway.calls("login"), 2);
}

#[tokio::test]
async fn rejected_token_is_replaced_on_the_next_call() {
	let gateway = Arc::new(FakeGateway::new());
	let engine = SyncEngine::new(
		Arc::clone(&gateway) as Arc<dyn Gateway>,
		Session::with_token(
			AccessToken::new(VALID_TOKEN),
			Some(me()),
			Some(LoginCredentials::new("ann", "pw")),
		),
		FollowStore::in_memory(),
		config(),
	);
	gateway.expire_token();

	let err = engine.refresh_places().await.unwrap_err();
	assert!(err.is_unauthorized());

	engine.refresh_places().await.unwrap();
	assert_eq!(gateway.calls("login"), 1);
	assert_eq!(gateway.calls("list_places"), 2);
}

#[tokio::test]
async fn nearest_places_respects_radius_tags_and_order() {
	let gateway = Arc::new(FakeGateway::new());
	gateway.add_place(place_dto(1, "Far", 25.0400, 121.5654, 8, Visibility::Public));
	gateway.add_place(place_dto(2, "Mid", 25.0332, 121.5654, 8, Visibility::Public));
	gateway.add_place(place_dto(3, "Near", 25.0331, 121.5654, 8, Visibility::Public));
	gateway.add_place(place_dto(4, "Mine", 25.0330, 121.5654, ME, Visibility::Private));
	let engine = engine(&gateway);
	engine.refresh_places().await.unwrap();

	let from = coord(25.0330, 121.5654);

	let all = engine
		.nearest_places(&NearbyQuery::new(from, 30.0, 10))
		.await;
	assert_eq!(remote_ids(&all), vec![4, 3, 2]);
	assert!(all.iter().all(|place| place.distance_to(&from) <= 30.0));

	let community = engine
		.nearest_places(&NearbyQuery::new(from, 30.0, 1).source(PlaceSource::Community))
		.await;
	assert_eq!(remote_ids(&community), vec![3]);

	let tagged = engine
		.nearest_places(&NearbyQuery::new(from, 30.0, 10).tag_filter("COF"))
		.await;
	assert_eq!(tagged.len(), 3);

	let untagged = engine
		.nearest_places(&NearbyQuery::new(from, 30.0, 10).tag_filter("bakery"))
		.await;
	assert!(untagged.is_empty());
}

#[tokio::test]
async fn external_candidates_merge_with_the_catalog() {
	let gateway = Arc::new(FakeGateway::new());
	gateway.add_place(place_dto(1, "Daily Drip", 25.0330, 121.5654, 8, Visibility::Public));
	let engine = engine(&gateway);
	engine.refresh_places().await.unwrap();

	let candidates = engine
		.candidates_near(
			&coord(25.0330, 121.5654),
			vec![
				Place::external("Daily Drip", PlaceType::Cafe, coord(25.0331, 121.5655)),
				Place::external("Bookshop", PlaceType::Shop, coord(25.0330, 121.5655)),
			],
		)
		.await;

	assert_eq!(candidates.len(), 2);
	assert_eq!(candidates[0].remote_id, 1);
	assert_eq!(candidates[1].name, "Bookshop");
	assert!(!candidates[1].is_persisted());
}

#[tokio::test]
async fn fetch_place_upserts_into_the_index() {
	let gateway = Arc::new(FakeGateway::new());
	gateway.add_place(place_dto(1, "Park", 25.0, 121.0, 8, Visibility::Public));
	let engine = engine(&gateway);

	let place = engine.fetch_place(1).await.unwrap();

	assert_eq!(engine.place(1).await, Some(place));
	assert!(matches!(
		engine.fetch_place(-1).await,
		Err(Error::InvalidInput(_))
	));
	assert_eq!(gateway.calls("get_place"), 1);
}

#[tokio::test]
async fn errors_carry_a_kind_and_a_message() {
	let gateway = Arc::new(FakeGateway::new());
	let engine = engine(&gateway);

	let err = engine.fetch_place(99).await.unwrap_err();

	assert_eq!(err.kind(), ErrorKind::HttpStatus);
	assert!(err.to_string().contains("not found"));
	assert_eq!(err.user_message(), "It no longer exists on the server.");
}
