diesel::table! {
    Asset (asset_id) {
        asset_id -> BigInt,
        name -> Text,
        file_url -> Text,
        ty -> Text,
        size -> BigInt,
        tags -> Nullable<Text>,
        uploaded_at -> BigInt,
    }
}
