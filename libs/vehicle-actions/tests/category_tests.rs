//! Integration tests for action categories and the built-in catalogue

#![allow(clippy::disallowed_methods)] // Integration test - unwrap is acceptable

use std::collections::BTreeSet;
use std::sync::Arc;

use errors::ErrorCode;
use vehicle_actions::catalog::door::{self, DOOR_ROW_1_LEFT, DOOR_ROW_1_RIGHT};
use vehicle_actions::catalog::light;
use vehicle_actions::catalog::seat::{self, SEAT_ROW_1_LEFT, SEAT_ROW_1_RIGHT};
use vehicle_actions::catalog::steering_wheel;
use vehicle_actions::catalog::window::{self, WINDOW_ROW_1_LEFT, WINDOW_ROW_1_RIGHT};
use vehicle_actions::helpers::{create_test_context, create_test_facade};
use vehicle_actions::permission::{PERMISSION_CONTROL_CAR_CLIMATE, PERMISSION_CONTROL_CAR_WINDOWS};
use vehicle_actions::{
    element_set, ActionCategory, ActionContext, ActionDef, ActionHandle, ActionKind, ActionParams,
    Catalog, ElementMap, GetAction, OffsetRequest, StaticPermissions,
};
use vehicle_bus::helpers::{create_test_cabin, seat_signal};
use vehicle_bus::ids::{self, light_state};
use vehicle_bus::{Access, AreaConfig, AreaType, MemoryBus, SignalConfig, Value, ValueType};

fn front_seats() -> BTreeSet<String> {
    element_set([SEAT_ROW_1_LEFT, SEAT_ROW_1_RIGHT])
}

fn front_doors() -> BTreeSet<String> {
    element_set([DOOR_ROW_1_LEFT, DOOR_ROW_1_RIGHT])
}

fn add_doors(bus: &Arc<MemoryBus>) {
    let doors = [ids::door::ROW_1_LEFT, ids::door::ROW_1_RIGHT];
    bus.add_signal(seat_signal(
        ids::DOOR_POS,
        ValueType::Int32,
        &doors,
        Some((Value::Int(0), Value::Int(100))),
    ));
    bus.add_signal(seat_signal(ids::DOOR_LOCK, ValueType::Boolean, &doors, None));
    for area in doors {
        bus.seed_value(ids::DOOR_POS, area, Value::Int(0));
        bus.seed_value(ids::DOOR_LOCK, area, Value::Bool(true));
    }
    bus.seed_value(ids::DOOR_POS, ids::door::ROW_1_RIGHT, Value::Int(40));
}

fn global_signal(id: i32, access: Access) -> SignalConfig {
    SignalConfig {
        id,
        value_type: ValueType::Int32,
        area_type: AreaType::Global,
        access,
        config_array: vec![],
        area_configs: vec![AreaConfig::new(0, access)],
    }
}

fn front_windows() -> BTreeSet<String> {
    element_set([WINDOW_ROW_1_LEFT, WINDOW_ROW_1_RIGHT])
}

fn add_windows(bus: &Arc<MemoryBus>) {
    let windows = [ids::window::ROW_1_LEFT, ids::window::ROW_1_RIGHT];
    let mut position = seat_signal(
        ids::WINDOW_POS,
        ValueType::Int32,
        &windows,
        Some((Value::Int(-5), Value::Int(10))),
    );
    position.area_type = AreaType::Window;
    bus.add_signal(position);
    let mut lock = seat_signal(ids::WINDOW_LOCK, ValueType::Boolean, &windows, None);
    lock.area_type = AreaType::Window;
    bus.add_signal(lock);

    bus.seed_value(ids::WINDOW_POS, ids::window::ROW_1_LEFT, Value::Int(0));
    bus.seed_value(ids::WINDOW_POS, ids::window::ROW_1_RIGHT, Value::Int(-3));
    for area in windows {
        bus.seed_value(ids::WINDOW_LOCK, area, Value::Bool(false));
    }
}

fn add_steering_wheel(bus: &Arc<MemoryBus>) {
    let mut signal = global_signal(ids::HVAC_STEERING_WHEEL_HEAT, Access::ReadWrite);
    signal.area_configs =
        vec![AreaConfig::new(0, Access::ReadWrite).with_range(Value::Int(-2), Value::Int(3))];
    bus.add_signal(signal);
    bus.seed_value(ids::HVAC_STEERING_WHEEL_HEAT, 0, Value::Int(2));
}

fn add_headlights(bus: &Arc<MemoryBus>) {
    bus.add_signal(global_signal(ids::HEADLIGHTS_STATE, Access::Read));
    bus.add_signal(global_signal(ids::HEADLIGHTS_SWITCH, Access::ReadWrite));
    bus.seed_value(ids::HEADLIGHTS_STATE, 0, Value::Int(light_state::DAYTIME_RUNNING));
    bus.seed_value(ids::HEADLIGHTS_SWITCH, 0, Value::Int(light_state::OFF));
}

// ============================================================================
// Operation table
// ============================================================================

#[test]
fn test_catalog_lists_every_operation() {
    let bus = create_test_cabin();
    let catalog = Catalog::new(&create_test_context(&bus)).unwrap();

    let operations = catalog.operations();
    let count = |category: &str| operations.iter().filter(|(c, _)| c == category).count();
    assert_eq!(count(seat::CATEGORY), 35);
    assert_eq!(count(door::CATEGORY), 7);
    assert_eq!(count(window::CATEGORY), 15);
    assert_eq!(count(steering_wheel::CATEGORY), 4);
    assert_eq!(count(light::CATEGORY), 3);

    let (_, increment) = operations
        .iter()
        .find(|(_, op)| op.name == seat::SEAT_ACTION_INCREMENT_HVAC_TARGET_TEMPERATURE)
        .unwrap();
    assert_eq!(increment.kind, ActionKind::Offset);
    assert_eq!(increment.value_type, ValueType::Float);
    assert!(increment.temperature);

    let json = serde_json::to_value(increment).unwrap();
    assert_eq!(json["kind"], "offset");
}

#[test]
fn test_find_routes_to_the_owning_category() {
    let bus = create_test_cabin();
    let catalog = Catalog::new(&create_test_context(&bus)).unwrap();

    assert_eq!(catalog.find(door::DOOR_ACTION_LOCK).unwrap().name(), door::CATEGORY);
    assert_eq!(
        catalog.find(light::EXTERNAL_LIGHT_ACTION_ENABLE_HEADLIGHTS).unwrap().name(),
        light::CATEGORY
    );
    assert!(matches!(
        catalog.find("SEAT_ACTION_EJECT"),
        Err(ErrorCode::InvalidApiArgument)
    ));
}

#[test]
fn test_unknown_action_and_wrong_kind() {
    let bus = create_test_cabin();
    let catalog = Catalog::new(&create_test_context(&bus)).unwrap();
    let seats = catalog.seats.category();

    assert!(matches!(
        seats.get_blocking("SEAT_ACTION_EJECT", &front_seats()),
        Err(ErrorCode::InvalidApiArgument)
    ));

    let request = OffsetRequest::Int {
        elements: front_seats(),
        offset: 1,
    };
    assert!(matches!(
        seats.offset_blocking(seat::SEAT_ACTION_GET_HVAC_FAN_SPEED, &request),
        Err(ErrorCode::BadValImpl)
    ));
    assert!(matches!(
        seats.get_blocking(seat::SEAT_ACTION_SET_HVAC_FAN_SPEED, &front_seats()),
        Err(ErrorCode::BadValImpl)
    ));
    assert_eq!(bus.write_count(), 0);
}

#[test]
fn test_offset_kind_must_match_the_signal() {
    let bus = create_test_cabin();
    let catalog = Catalog::new(&create_test_context(&bus)).unwrap();
    let seats = catalog.seats.category();

    let float_request = OffsetRequest::Float {
        elements: front_seats(),
        offset: 1.0,
    };
    assert!(matches!(
        seats.offset_blocking(seat::SEAT_ACTION_INCREMENT_HVAC_FAN_SPEED, &float_request),
        Err(ErrorCode::BadValImpl)
    ));

    // Temperature signals only take temperature offsets
    assert!(matches!(
        seats.offset_blocking(seat::SEAT_ACTION_INCREMENT_HVAC_TARGET_TEMPERATURE, &float_request),
        Err(ErrorCode::BadValImpl)
    ));
    assert_eq!(bus.write_count(), 0);
}

#[test]
fn test_category_rejects_duplicates_and_empty_tables() {
    let bus = create_test_cabin();
    let ctx = create_test_context(&bus);
    let elements = ElementMap::new([(SEAT_ROW_1_LEFT, ids::seat::ROW_1_LEFT)]).unwrap();
    let get = || {
        let def = ActionDef::new(
            "GET_FAN",
            ids::HVAC_FAN_SPEED,
            ValueType::Int32,
            PERMISSION_CONTROL_CAR_CLIMATE,
            elements.clone(),
        );
        ActionHandle::Get(GetAction::new(ctx.clone(), def).unwrap())
    };

    assert!(ActionCategory::new("fans", vec![get()]).is_ok());
    assert!(matches!(
        ActionCategory::new("fans", vec![get(), get()]),
        Err(ErrorCode::BadValImpl)
    ));
    assert!(matches!(
        ActionCategory::new("fans", Vec::new()),
        Err(ErrorCode::BadValImpl)
    ));
}

// ============================================================================
// Permissions and support
// ============================================================================

#[test]
fn test_missing_permission_is_permanent() {
    let bus = create_test_cabin();
    let ctx = ActionContext::new(
        create_test_facade(&bus),
        Arc::new(StaticPermissions::new([PERMISSION_CONTROL_CAR_CLIMATE])),
    );
    let catalog = Catalog::new(&ctx).unwrap();

    assert_eq!(
        catalog
            .seats
            .category()
            .is_action_supported(seat::SEAT_ACTION_GET_HVAC_FAN_SPEED),
        Ok(true)
    );
    assert_eq!(
        catalog.doors.category().is_action_supported(door::DOOR_ACTION_LOCK),
        Err(ErrorCode::MissingRequiredPermission)
    );
    add_doors(&bus);
    assert_eq!(
        catalog.doors.category().is_action_supported(door::DOOR_ACTION_LOCK),
        Err(ErrorCode::MissingRequiredPermission)
    );
}

#[tokio::test]
async fn test_cabin_without_doors() {
    let bus = create_test_cabin();
    let catalog = Catalog::new(&create_test_context(&bus)).unwrap();

    assert_eq!(
        catalog.doors.category().is_action_supported(door::DOOR_ACTION_IS_OPEN),
        Ok(false)
    );
    assert!(matches!(
        catalog.doors.is_open(front_doors()).await,
        Err(ErrorCode::ActionNotSupported)
    ));
    assert!(matches!(
        catalog.doors.lock(front_doors()).await,
        Err(ErrorCode::ActionNotSupported)
    ));
}

#[test]
fn test_degenerate_float_bounds_fail_resolution() {
    const SEAT_FLOAT_SIGNAL: i32 = 0x1560_0F01;
    let left = [ids::seat::ROW_1_LEFT];
    let cases = [
        (16_777_216.0, 16_777_220.0),
        (-1.0e9, 1.0e9),
        (f32::NEG_INFINITY, 0.0),
        (f32::NAN, 1.0),
    ];

    for (min, max) in cases {
        let bus = create_test_cabin();
        bus.add_signal(seat_signal(
            SEAT_FLOAT_SIGNAL,
            ValueType::Float,
            &left,
            Some((Value::Float(min), Value::Float(max))),
        ));
        let ctx = create_test_context(&bus);
        let elements = ElementMap::new([(SEAT_ROW_1_LEFT, ids::seat::ROW_1_LEFT)]).unwrap();
        let def = ActionDef::new(
            "GET_SEAT_FLOAT",
            SEAT_FLOAT_SIGNAL,
            ValueType::Float,
            PERMISSION_CONTROL_CAR_CLIMATE,
            elements,
        )
        .with_params(ActionParams::new().min_max());
        let category = ActionCategory::new(
            "floats",
            vec![ActionHandle::Get(GetAction::new(ctx, def).unwrap())],
        )
        .unwrap();

        assert_eq!(
            category.is_action_supported("GET_SEAT_FLOAT"),
            Err(ErrorCode::BadPlatformImpl),
            "bounds {min}..{max}"
        );
    }
}

// ============================================================================
// Doors and lights
// ============================================================================

#[tokio::test]
async fn test_door_operations() {
    let bus = create_test_cabin();
    add_doors(&bus);
    let catalog = Catalog::new(&create_test_context(&bus)).unwrap();
    let doors = &catalog.doors;

    let open = doors.is_open(front_doors()).await.unwrap();
    assert_eq!(open.values[DOOR_ROW_1_LEFT], Ok(false));
    assert_eq!(open.values[DOOR_ROW_1_RIGHT], Ok(true));

    let positions = doors.get_open_position(front_doors()).await.unwrap();
    assert_eq!(positions.values[DOOR_ROW_1_RIGHT], Ok(40));

    let result = doors.close(front_doors()).await.unwrap();
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[DOOR_ROW_1_LEFT], ErrorCode::ValueAlreadySet);
    assert_eq!(bus.current_value(ids::DOOR_POS, ids::door::ROW_1_RIGHT), Some(Value::Int(0)));

    let result = doors
        .set_open_position(element_set([DOOR_ROW_1_LEFT]), 150)
        .await
        .unwrap();
    assert_eq!(result.errors[DOOR_ROW_1_LEFT], ErrorCode::ValueNotSupported);

    let result = doors.unlock(front_doors()).await.unwrap();
    assert!(result.is_success());
    let locked = doors.is_locked(front_doors()).await.unwrap();
    assert_eq!(locked.values[DOOR_ROW_1_LEFT], Ok(false));

    assert!(matches!(
        doors.lock(element_set([door::DOOR_HOOD])).await,
        Err(ErrorCode::InvalidApiArgument)
    ));
}

#[tokio::test]
async fn test_headlights_use_the_global_element() {
    let bus = create_test_cabin();
    add_headlights(&bus);
    let catalog = Catalog::new(&create_test_context(&bus)).unwrap();
    let lights = &catalog.lights;

    // Daytime running lights do not count as enabled
    let enabled = lights.are_headlights_enabled().await.unwrap();
    assert_eq!(enabled.value, Ok(false));

    let result = lights.enable_headlights().await.unwrap();
    assert_eq!(result.error, None);
    assert_eq!(
        bus.current_value(ids::HEADLIGHTS_SWITCH, 0),
        Some(Value::Int(light_state::ON))
    );

    let result = lights.enable_headlights().await.unwrap();
    assert_eq!(result.error, Some(ErrorCode::ValueAlreadySet));
}

// ============================================================================
// Windows and steering wheel
// ============================================================================

#[tokio::test]
async fn test_window_open_and_vent_positions() {
    let bus = create_test_cabin();
    add_windows(&bus);
    let catalog = Catalog::new(&create_test_context(&bus)).unwrap();
    let windows = &catalog.windows;

    // A vented window is open but has no open position
    let open = windows.is_open(front_windows()).await.unwrap();
    assert_eq!(open.values[WINDOW_ROW_1_LEFT], Ok(false));
    assert_eq!(open.values[WINDOW_ROW_1_RIGHT], Ok(true));
    let positions = windows.get_open_position(front_windows()).await.unwrap();
    assert_eq!(positions.values[WINDOW_ROW_1_RIGHT], Ok(0));
    let vents = windows.get_vent_position(front_windows()).await.unwrap();
    assert_eq!(vents.values[WINDOW_ROW_1_LEFT], Ok(0));
    assert_eq!(vents.values[WINDOW_ROW_1_RIGHT], Ok(3));

    let result = windows
        .set_vent_position(element_set([WINDOW_ROW_1_LEFT]), 2)
        .await
        .unwrap();
    assert!(result.is_success());
    assert_eq!(
        bus.current_value(ids::WINDOW_POS, ids::window::ROW_1_LEFT),
        Some(Value::Int(-2))
    );

    // Vent range is -5..=0 once the sign is flipped
    let result = windows
        .set_vent_position(element_set([WINDOW_ROW_1_LEFT]), 6)
        .await
        .unwrap();
    assert_eq!(result.errors[WINDOW_ROW_1_LEFT], ErrorCode::ValueNotSupported);

    assert!(matches!(
        windows.set_vent_position(front_windows(), -1).await,
        Err(ErrorCode::InvalidApiArgument)
    ));
    assert!(matches!(
        windows.set_open_position(front_windows(), -1).await,
        Err(ErrorCode::InvalidApiArgument)
    ));

    let result = windows.close(front_windows()).await.unwrap();
    assert!(result.is_success());
    assert_eq!(
        bus.current_value(ids::WINDOW_POS, ids::window::ROW_1_RIGHT),
        Some(Value::Int(0))
    );
}

#[tokio::test]
async fn test_window_child_lock_and_missing_defrosters() {
    let bus = create_test_cabin();
    add_windows(&bus);
    let catalog = Catalog::new(&create_test_context(&bus)).unwrap();
    let windows = &catalog.windows;

    let result = windows.enable_child_lock(front_windows()).await.unwrap();
    assert!(result.is_success());
    let locked = windows.is_child_locked(front_windows()).await.unwrap();
    assert_eq!(locked.values[WINDOW_ROW_1_LEFT], Ok(true));

    assert_eq!(
        windows
            .category()
            .is_action_supported(window::WINDOW_ACTION_ENABLE_HVAC_DEFROSTER),
        Ok(false)
    );
    assert!(matches!(
        windows.enable_electric_defroster(front_windows()).await,
        Err(ErrorCode::ActionNotSupported)
    ));
}

#[test]
fn test_window_defrosters_need_climate_permission() {
    let bus = create_test_cabin();
    add_windows(&bus);
    let ctx = ActionContext::new(
        create_test_facade(&bus),
        Arc::new(StaticPermissions::new([PERMISSION_CONTROL_CAR_WINDOWS])),
    );
    let catalog = Catalog::new(&ctx).unwrap();
    let windows = catalog.windows.category();

    assert_eq!(
        windows.is_action_supported(window::WINDOW_ACTION_IS_CHILD_LOCKED),
        Ok(true)
    );
    assert_eq!(
        windows.is_action_supported(window::WINDOW_ACTION_IS_HVAC_DEFROSTER_ENABLED),
        Err(ErrorCode::MissingRequiredPermission)
    );
}

#[tokio::test]
async fn test_steering_wheel_heating_and_cooling() {
    let bus = create_test_cabin();
    add_steering_wheel(&bus);
    let catalog = Catalog::new(&create_test_context(&bus)).unwrap();
    let wheel = &catalog.steering_wheel;

    assert_eq!(wheel.get_heating_level().await.unwrap().value, Ok(2));
    assert_eq!(wheel.get_cooling_level().await.unwrap().value, Ok(0));

    let result = wheel.set_cooling_level(2).await.unwrap();
    assert_eq!(result.error, None);
    assert_eq!(
        bus.current_value(ids::HVAC_STEERING_WHEEL_HEAT, 0),
        Some(Value::Int(-2))
    );
    assert_eq!(wheel.get_cooling_level().await.unwrap().value, Ok(2));
    assert_eq!(wheel.get_heating_level().await.unwrap().value, Ok(0));

    let result = wheel.set_heating_level(4).await.unwrap();
    assert_eq!(result.error, Some(ErrorCode::ValueNotSupported));
    assert!(matches!(
        wheel.set_heating_level(-1).await,
        Err(ErrorCode::InvalidApiArgument)
    ));
    assert!(matches!(
        wheel.set_cooling_level(-1).await,
        Err(ErrorCode::InvalidApiArgument)
    ));
}
