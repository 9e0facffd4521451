diesel::table! {
    cve_entries (id) {
        id -> Int4,
        cve_id -> Text,
        source_identifier -> Text,
        published -> Nullable<Timestamp>,
        last_modified -> Nullable<Timestamp>,
        vuln_status -> Text,
    }
}

diesel::table! {
    descriptions (id) {
        id -> Int4,
        cve_entry_id -> Int4,
        lang -> Text,
        description -> Text,
    }
}

diesel::table! {
    metrics (id) {
        id -> Int4,
        cve_entry_id -> Int4,
        version -> Text,
        vector_string -> Text,
        attack_vector -> Text,
        attack_complexity -> Text,
        privileges_required -> Text,
        user_interaction -> Text,
        scope -> Text,
        confidentiality_impact -> Text,
        integrity_impact -> Text,
        availability_impact -> Text,
        base_score -> Float8,
        base_severity -> Text,
        exploitability_score -> Float8,
        impact_score -> Float8,
    }
}

diesel::table! {
    weaknesses (id) {
        id -> Int4,
        cve_entry_id -> Int4,
        source -> Text,
        description -> Text,
    }
}

diesel::table! {
    configurations (id) {
        id -> Int4,
        cve_entry_id -> Int4,
        operator -> Text,
        negate -> Bool,
    }
}

diesel::table! {
    products (id) {
        id -> Int4,
        config_id -> Int4,
        vulnerable -> Bool,
        criteria -> Text,
        part -> Text,
        vendor -> Text,
        product -> Text,
        version -> Text,
        version_end_excluding -> Text,
    }
}

diesel::table! {
    cve_references (id) {
        id -> Int4,
        cve_entry_id -> Int4,
        url -> Text,
        source -> Text,
        tags -> Array<Text>,
    }
}

diesel::joinable!(descriptions -> cve_entries (cve_entry_id));
diesel::joinable!(metrics -> cve_entries (cve_entry_id));
diesel::joinable!(weaknesses -> cve_entries (cve_entry_id));
diesel::joinable!(configurations -> cve_entries (cve_entry_id));
diesel::joinable!(products -> configurations (config_id));
diesel::joinable!(cve_references -> cve_entries (cve_entry_id));

diesel::allow_tables_to_appear_in_same_query!(
    cve_entries,
    descriptions,
    metrics,
    weaknesses,
    configurations,
    products,
    cve_references,
);
