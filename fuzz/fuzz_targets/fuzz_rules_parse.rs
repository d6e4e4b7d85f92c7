#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;

use javelin_corpus::RuleSet;

mod utils;

fuzz_target!(|data: &[u8]| {
    let Some(text) = utils::truncate_utf8(data) else {
        return;
    };

    // Oracle: compiling a rule file never panics, and a compiled set matches
    // arbitrary rows without panicking.
    let Ok(rules) = RuleSet::from_json(text) else {
        return;
    };
    let mut row: HashMap<&str, &str> = HashMap::new();
    row.insert("class", "java.util.List");
    row.insert("member", "addAll");
    let _ = rules.matches(&row);
});
