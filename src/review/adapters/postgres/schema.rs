//! Diesel schema for review persistence.

diesel::table! {
    /// Users; team membership is the `team_name` column.
    users (user_id) {
        /// External user identifier.
        user_id -> Text,
        /// Display name.
        username -> Text,
        /// Team the user belongs to, if any.
        team_name -> Nullable<Text>,
        /// Whether the user is eligible for review assignment.
        is_active -> Bool,
        /// Insertion sequence used for stable roster order.
        roster_seq -> Int8,
    }
}

diesel::table! {
    /// Pull requests with their assigned reviewers.
    pull_requests (pull_request_id) {
        /// External pull request identifier.
        pull_request_id -> Text,
        /// Display name.
        pull_request_name -> Text,
        /// Author user identifier.
        author_id -> Text,
        /// Lifecycle status.
        #[max_length = 16]
        status -> Varchar,
        /// JSON array of reviewer identifiers in slot order.
        assigned_reviewers -> Jsonb,
        /// Optimistic-concurrency version.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Merge timestamp.
        merged_at -> Nullable<Timestamptz>,
        /// Insertion sequence used for stable listing order.
        created_seq -> Int8,
    }
}

diesel::joinable!(pull_requests -> users (author_id));
diesel::allow_tables_to_appear_in_same_query!(users, pull_requests);
