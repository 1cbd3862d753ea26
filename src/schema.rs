// Draftdex schema - draft event tables for Diesel ORM

diesel::table! {
    schema_versions (id) {
        id -> Integer,
        version -> Text,
        name -> Text,
        features -> Text,
        introduced_at -> Text,
    }
}

diesel::table! {
    draft_events (id) {
        id -> Integer,
        external_draft_id -> Nullable<Text>,
        patch -> Nullable<Text>,
        date_time -> Text,
        total_pokemon_sold -> Integer,
        format_version -> Text,
        source_file -> Nullable<Text>,
        ingested_at -> Text,
        legacy_source -> Nullable<Text>,   // legacy table family this row was copied from
        legacy_id -> Nullable<Integer>,    // id in that legacy table
    }
}

diesel::table! {
    draft_event_players (id) {
        id -> Integer,
        draft_id -> Integer,
        player_name -> Text,
        starting_money -> Integer,
        remaining_money -> Integer,
    }
}

diesel::table! {
    draft_event_picks (id) {
        id -> Integer,
        draft_id -> Integer,
        draft_order -> Nullable<Integer>,  // NULL for legacy exports
        pokemon -> Text,
        drafted_by -> Text,
        cost -> Integer,
    }
}

diesel::joinable!(draft_event_players -> draft_events (draft_id));
diesel::joinable!(draft_event_picks -> draft_events (draft_id));

diesel::allow_tables_to_appear_in_same_query!(
    draft_events,
    draft_event_players,
    draft_event_picks,
);
