#![no_main]

use libfuzzer_sys::fuzz_target;

use javelin_corpus::{TypeParser, TypeVarScope};
use javelin_types::TypeStore;

mod utils;

fuzz_target!(|data: &[u8]| {
    let Some(text) = utils::truncate_utf8(data) else {
        return;
    };

    // Oracle: never panic / never hang on a malformed signature. `None` is
    // the expected outcome for garbage input.
    let mut store = TypeStore::with_builtins();
    let scope = TypeVarScope::new();
    if let Some(ty) = TypeParser::new(&mut store, &scope).parse(text) {
        // Anything that parses must also render.
        let _ = store.display(&ty).to_string();
    }
});
