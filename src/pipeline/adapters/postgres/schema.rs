//! Diesel schema for pipeline persistence.

diesel::table! {
    /// Pipeline stages rendered as board columns.
    stages (id) {
        /// Stage identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 100]
        name -> Varchar,
        /// `#rrggbb` column color.
        #[max_length = 7]
        color -> Varchar,
        /// One-based column position.
        display_order -> Int4,
        /// Stage category (`normal`, `won`, `lost`).
        #[max_length = 20]
        category -> Varchar,
    }
}

diesel::table! {
    /// Lead records.
    leads (id) {
        /// Lead identifier.
        id -> Uuid,
        /// Customer display name.
        #[max_length = 255]
        customer_name -> Varchar,
        /// Customer phone number.
        #[max_length = 50]
        customer_phone -> Varchar,
        /// Current stage.
        stage_id -> Uuid,
        /// Owning seller.
        seller_id -> Uuid,
        /// Price in minor units.
        price_minor_units -> Nullable<Int8>,
        /// Free-form notes.
        notes -> Nullable<Text>,
        /// Delivery status label.
        #[max_length = 100]
        delivery_status -> Nullable<Varchar>,
        /// Action status label.
        #[max_length = 100]
        action_status -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last mutation timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only lead comments.
    lead_comments (id) {
        /// Comment identifier.
        id -> Uuid,
        /// Lead the comment belongs to.
        lead_id -> Uuid,
        /// Author.
        author_id -> Uuid,
        /// Comment text.
        body -> Text,
        /// Comment kind (`user`, `system`).
        #[max_length = 20]
        kind -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Seller follow-up tasks.
    follow_up_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Linked lead, if any.
        lead_id -> Nullable<Uuid>,
        /// Owning seller.
        seller_id -> Uuid,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Task description.
        description -> Nullable<Text>,
        /// Due timestamp.
        due_at -> Timestamptz,
        /// Task status (`pending`, `completed`).
        #[max_length = 20]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last status change timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(leads -> stages (stage_id));
diesel::joinable!(lead_comments -> leads (lead_id));
diesel::joinable!(follow_up_tasks -> leads (lead_id));

diesel::allow_tables_to_appear_in_same_query!(stages, leads, lead_comments, follow_up_tasks);
