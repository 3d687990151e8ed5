//! In-page JavaScript evaluated by the CDP page
//!
//! Every script is a self-invoking function expression that returns a JSON
//! value, so results can be read back with `EvaluationResult::into_value`.
//! Selectors and class names are embedded as JSON string literals.
//!
//! Foreground paths and hit-region paths are paired by index: the hit region
//! at position `i` is the touch target layered under foreground path `i`.

use crate::config::Selectors;
use crate::page::{HitTarget, Point};

/// Quote a value as a JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Shared declarations: both path lists, the dimmed class and a `touchAt` helper
fn prelude(selectors: &Selectors, at: Point) -> String {
    format!(
        r#"
        const foregroundPaths = document.querySelectorAll({foreground});
        const hitareaPaths = document.querySelectorAll({hit_region});
        const dimmedClass = {dimmed};
        const touchAt = (hitPath) => {{
            const touch = new Touch({{ identifier: 1, target: hitPath, clientX: {x}, clientY: {y} }});
            hitPath.dispatchEvent(new TouchEvent('touchstart', {{
                touches: [touch], targetTouches: [touch], changedTouches: [touch], bubbles: true
            }}));
            return 'dispatched';
        }};"#,
        foreground = js_string(&selectors.foreground),
        hit_region = js_string(&selectors.hit_region),
        dimmed = js_string(&selectors.dimmed_class),
        x = at.x,
        y = at.y,
    )
}

/// Dispatch a `touchstart` on the chosen hit region and report the outcome code
pub fn touch(selectors: &Selectors, target: HitTarget, at: Point) -> String {
    let body = match target {
        HitTarget::First => {
            r#"
        const hitPath = hitareaPaths[0];
        if (!hitPath) {
            return 'no hit region';
        }
        return touchAt(hitPath);"#
        }
        HitTarget::FirstDimmed => {
            r#"
        for (let i = 0; i < foregroundPaths.length; i++) {
            if (foregroundPaths[i].classList.contains(dimmedClass)) {
                const hitPath = hitareaPaths[i];
                if (!hitPath) {
                    return 'no hit region';
                }
                if (getComputedStyle(hitPath).pointerEvents === 'none') {
                    return 'blocked';
                }
                return touchAt(hitPath);
            }
        }
        return 'no dimmed paths';"#
        }
        HitTarget::FirstActive => {
            r#"
        for (let i = 0; i < foregroundPaths.length; i++) {
            if (!foregroundPaths[i].classList.contains(dimmedClass)) {
                const hitPath = hitareaPaths[i];
                if (!hitPath) {
                    return 'no hit region';
                }
                return touchAt(hitPath);
            }
        }
        return 'no active paths';"#
        }
    };

    format!("(() => {{{}{}\n}})()", prelude(selectors, at), body)
}

/// Check the hit region under every dimmed path
///
/// Evaluates to `{ dimmed, ungated }`: the number of dimmed foreground paths
/// and, for each one whose hit region is not `pointer-events: none`, its
/// `{ index, pointerEvents }`.
pub fn dimmed_gating(selectors: &Selectors) -> String {
    format!(
        r#"(() => {{
        const foregroundPaths = document.querySelectorAll({foreground});
        const hitareaPaths = document.querySelectorAll({hit_region});
        let dimmed = 0;
        const ungated = [];
        for (let i = 0; i < foregroundPaths.length; i++) {{
            if (!foregroundPaths[i].classList.contains({dimmed})) {{
                continue;
            }}
            dimmed++;
            const hitPath = hitareaPaths[i];
            const pointerEvents = hitPath ? getComputedStyle(hitPath).pointerEvents : 'no hit region';
            if (pointerEvents !== 'none') {{
                ungated.push({{ index: i, pointerEvents }});
            }}
        }}
        return {{ dimmed, ungated }};
    }})()"#,
        foreground = js_string(&selectors.foreground),
        hit_region = js_string(&selectors.hit_region),
        dimmed = js_string(&selectors.dimmed_class),
    )
}

/// Remove the visible class from the tooltip; `true` if a tooltip exists
pub fn dismiss_tooltip(selectors: &Selectors) -> String {
    format!(
        r#"(() => {{
        const tooltip = document.querySelector({tooltip});
        if (tooltip) {{
            tooltip.classList.remove({visible});
        }}
        return !!tooltip;
    }})()"#,
        tooltip = js_string(&selectors.tooltip),
        visible = js_string(&selectors.visible_class),
    )
}

/// Client rectangle of the first element matching `selector`
///
/// Evaluates to `{ found: false }` when nothing matches.
pub fn bounding_rect(selector: &str) -> String {
    format!(
        r#"(() => {{
        const element = document.querySelector({selector});
        if (!element) {{
            return {{ found: false }};
        }}
        const rect = element.getBoundingClientRect();
        return {{ found: true, x: rect.x, y: rect.y, width: rect.width, height: rect.height }};
    }})()"#,
        selector = js_string(selector),
    )
}

/// Number of elements matching `selector`
pub fn count(selector: &str) -> String {
    format!(
        "document.querySelectorAll({}).length",
        js_string(selector)
    )
}
