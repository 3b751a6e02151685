//! Esquema Diesel (escrito a mano, equivalente a `diesel print-schema`).

diesel::table! {
    job_executions (seq) {
        seq -> BigInt,
        id -> Text,
        job_name -> Text,
        identity_hash -> Text,
        parameters_json -> Text,
        status -> Text,
        exit_code -> Text,
        exit_description -> Text,
        create_time -> Text,
        start_time -> Nullable<Text>,
        end_time -> Nullable<Text>,
        context_json -> Nullable<Text>,
        failures_json -> Text,
    }
}

diesel::table! {
    step_executions (seq) {
        seq -> BigInt,
        id -> Text,
        job_execution_id -> Text,
        step_name -> Text,
        status -> Text,
        exit_code -> Text,
        exit_description -> Text,
        start_time -> Nullable<Text>,
        end_time -> Nullable<Text>,
        read_count -> BigInt,
        write_count -> BigInt,
        skip_count -> BigInt,
        commit_count -> BigInt,
        rollback_count -> BigInt,
        context_json -> Text,
        failures_json -> Text,
    }
}

diesel::table! {
    event_log (seq) {
        seq -> BigInt,
        job_execution_id -> Text,
        event_seq -> BigInt,
        ts -> Text,
        event_type -> Text,
        payload -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(job_executions, step_executions, event_log,);
