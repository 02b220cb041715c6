use super::{json_pretty, EXIT_SUCCESS};
use rsprobe_policy::{EtagSyntax, ListingShape, VersionPolicy};

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub fn run(version: u32, json: bool) -> Result<u8, String> {
    let policy = VersionPolicy::for_version(version);
    if json {
        println!("{}", json_pretty(&policy)?);
        return Ok(EXIT_SUCCESS);
    }

    let etag = match policy.etag_syntax {
        EtagSyntax::BareDigits => "bare digits",
        EtagSyntax::QuotedString => "quoted string",
    };
    let listing = match policy.listing_shape {
        ListingShape::FlatMap => "flat map",
        ListingShape::ItemsWrapped => "items-wrapped",
    };
    println!("draft-dejong-remotestorage-{version:02}");
    println!("  etag syntax:           {etag}");
    println!("  listing shape:         {listing}");
    println!(
        "  listing @context:      {}",
        policy.listing_context.unwrap_or("(none)")
    );
    println!(
        "  path collision status: {}",
        policy
            .path_collision_statuses()
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(" or ")
    );
    println!(
        "  conditional requests:  {}",
        yes_no(policy.supports_conditional_headers)
    );
    println!("  rejects Content-Range: {}", yes_no(policy.rejects_content_range));
    println!("  Content-Length:        {}", yes_no(policy.supports_content_length));
    println!("  Expires: 0:            {}", yes_no(policy.expires_zero));
    println!(
        "  Cache-Control:         {}",
        policy.expected_cache_control().unwrap_or("(not required)")
    );
    println!("  Last-Modified:         {}", yes_no(policy.supports_last_modified));
    Ok(EXIT_SUCCESS)
}
