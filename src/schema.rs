diesel::table! {
    holdings (id) {
        id -> Text,
        user_id -> Text,
        holding_type -> Text,
        symbol -> Text,
        name -> Text,
        category -> Nullable<Text>,
        current_price -> Double,
        total_quantity -> Double,
        average_cost -> Double,
        total_cost -> Double,
        current_value -> Double,
        total_income -> Double,
        last_transaction_date -> Nullable<Date>,
        transaction_count -> Integer,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    transactions (id) {
        id -> Text,
        user_id -> Text,
        holding_id -> Text,
        txn_type -> Text,
        txn_date -> Date,
        quantity -> Double,
        price -> Double,
        amount -> Double,
        interest_rate -> Nullable<Double>,
        interest_start_date -> Nullable<Date>,
        is_deleted -> Bool,
        deleted_at -> Nullable<Timestamp>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    portfolio_aggregates (user_id) {
        user_id -> Text,
        total_cost -> Double,
        current_value -> Double,
        total_income -> Double,
        total_gain -> Double,
        total_return -> Double,
        by_type -> Text,
        last_calculated -> Timestamp,
    }
}

diesel::table! {
    cache_entries (cache_key) {
        cache_key -> Text,
        payload -> Text,
        written_at -> Timestamp,
    }
}

diesel::joinable!(transactions -> holdings (holding_id));

diesel::allow_tables_to_appear_in_same_query!(holdings, transactions);
