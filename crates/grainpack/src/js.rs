//! JavaScript rendering of a bundle
//!
//! Produces a CommonJS module: the runtime shim, one registration per
//! bundled module, and an exported function that runs the root module.

use crate::emitter::Bundle;
use std::fmt::Write;

/// Render a bundle as a self-executing JavaScript module
pub fn render_js(bundle: &Bundle) -> String {
    let mut out = String::new();

    out.push_str(&bundle.shim);
    out.push_str("\n\n");
    out.push_str("var grainModules = {};\n");
    out.push_str("var runner = Grain.buildGrainRunner(function(name) {\n");
    out.push_str("  return grainModules[name];\n");
    out.push_str("});\n\n");

    for (name, bytes) in &bundle.modules {
        let _ = writeln!(
            out,
            "grainModules[{}] = runner.loadBuffer({});",
            quote(name),
            array_buffer(bytes)
        );
    }

    out.push_str("\nmodule.exports = function(imports) {\n");
    out.push_str("  if (imports && runner.addJSImports) runner.addJSImports(imports);\n\n");
    out.push_str("  return runner\n");
    let _ = writeln!(out, "    .runBufferUnboxed({})", array_buffer(&bundle.root));
    out.push_str("    .then(function(result) {\n");
    out.push_str("      return Grain.grainToString(runner, result);\n");
    out.push_str("    });\n");
    out.push_str("};\n");

    out
}

/// JSON string literal for a module name
fn quote(name: &str) -> String {
    // Serializing a str cannot fail
    serde_json::to_string(name).unwrap_or_default()
}

/// Expression building an `ArrayBuffer` with exactly `bytes`
pub fn array_buffer(bytes: &[u8]) -> String {
    let mut list = String::with_capacity(bytes.len() * 4);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            list.push(',');
        }
        let _ = write!(list, "{}", byte);
    }

    format!(
        "(function() {{ var buffer = new ArrayBuffer({}); new Uint8Array(buffer).set([{}]); return buffer; }})()",
        bytes.len(),
        list
    )
}
