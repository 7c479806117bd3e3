// Mirrors the DDL in `db::SCHEMA`; keep both in step.

diesel::table! {
    devices (id) {
        id -> Integer,
        uuid -> Text,
        name -> Text,
        version -> Text,
        address -> Text,
        room_id -> Nullable<Integer>,
        created_at -> BigInt,
    }
}

diesel::table! {
    rooms (id) {
        id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    weather (id) {
        id -> Integer,
        device_uuid -> Text,
        temperature -> Double,
        humidity -> Double,
        pressure -> Double,
        created_at -> BigInt,
    }
}

diesel::joinable!(devices -> rooms (room_id));

diesel::allow_tables_to_appear_in_same_query!(
    devices,
    rooms,
    weather,
);
