//! Client-side fetch/XHR interception script.
//!
//! The script is a fixed template. The only inputs are the proxy prefix and
//! the target origin, both embedded as JS string literals.

use regex::Regex;
use std::sync::LazyLock;

use super::proxify::PASSTHROUGH_SCHEMES;

static BODY_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body>").expect("valid body regex"));
static HEAD_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head>").expect("valid head regex"));

/// Render the hook script for a given proxy prefix (`/api/proxy?u=`) and
/// target origin (`https://a.test`).
pub fn client_hook_script(proxy_prefix: &str, target_origin: &str) -> String {
    let skip = PASSTHROUGH_SCHEMES
        .iter()
        .map(|s| js_string(s))
        .collect::<Vec<_>>()
        .join(",");

    format!(
        r#"<script>
(function(){{try{{
var P={prefix},O={origin},S=[{skip}];
var toProxy=function(u){{try{{
if(!u)return u;
u=String(u);
for(var i=0;i<S.length;i++){{if(u.startsWith(S[i]))return u;}}
return P+encodeURIComponent(new URL(u,O).toString());
}}catch(e){{return u;}}}};
var _fetch=window.fetch;
if(_fetch){{window.fetch=function(input,init){{
try{{
if(typeof Request!=='undefined'&&input instanceof Request){{return _fetch.call(this,new Request(toProxy(input.url),input),init);}}
return _fetch.call(this,toProxy(input),init);
}}catch(e){{return _fetch.call(this,input,init);}}
}};}}
var XO=XMLHttpRequest.prototype.open;
XMLHttpRequest.prototype.open=function(m,u){{
var rest=Array.prototype.slice.call(arguments,2);
try{{return XO.apply(this,[m,toProxy(u)].concat(rest));}}
catch(e){{return XO.apply(this,[m,u].concat(rest));}}
}};
}}catch(e){{}}}})();
</script>"#,
        prefix = js_string(proxy_prefix),
        origin = js_string(target_origin),
        skip = skip,
    )
}

/// Insert the hook before `</body>`, else before `</head>`, else at the end.
pub fn inject_client_hook(html: &str, proxy_prefix: &str, target_origin: &str) -> String {
    let script = client_hook_script(proxy_prefix, target_origin);

    let anchor = BODY_CLOSE_RE
        .find(html)
        .or_else(|| HEAD_CLOSE_RE.find(html))
        .map(|m| m.start());

    match anchor {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + script.len() + 1);
            out.push_str(&html[..at]);
            out.push_str(&script);
            out.push('\n');
            out.push_str(&html[at..]);
            out
        }
        None => format!("{html}{script}"),
    }
}

/// Quote `s` as a JS string literal that is also safe inside `<script>`.
fn js_string(s: &str) -> String {
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}
