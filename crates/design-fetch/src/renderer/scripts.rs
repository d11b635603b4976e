//! JavaScript evaluated inside the page by the Chromium renderer.
//!
//! Scripts that return structured data serialize it with `JSON.stringify`
//! so the result crosses the protocol boundary as a single string.

/// Visible markup used for settle detection.
pub const SAMPLE_CONTENT: &str = "document.body ? document.body.innerHTML : ''";

/// `document.body` and its direct element children with their layout size.
pub const REGIONS: &str = r#"
(() => {
    const root = document.body;
    if (!root) return JSON.stringify([]);
    const nodes = [root, ...Array.from(root.children)];
    return JSON.stringify(nodes.map((el, index) => {
        const rect = el.getBoundingClientRect();
        return { index, width: rect.width, height: rect.height };
    }));
})()
"#;

/// Viewport and root font size.
pub const PAGE_METRICS: &str = r#"
(() => JSON.stringify({
    width: window.innerWidth,
    height: window.innerHeight,
    rootFontSize: parseFloat(getComputedStyle(document.documentElement).fontSize)
}))()
"#;

/// `background-color` of region `index`, or null if it is gone.
pub fn background_color(index: usize) -> String {
    format!(
        r#"
(() => {{
    const root = document.body;
    const el = root ? [root, ...Array.from(root.children)][{index}] : null;
    return el ? getComputedStyle(el).backgroundColor : null;
}})()
"#
    )
}

/// Color a bare text node inside region `index` would render with. Text
/// nodes take `color` from their parent, so this is the region's own computed
/// color.
pub fn text_color(index: usize) -> String {
    format!(
        r#"
(() => {{
    const root = document.body;
    const el = root ? [root, ...Array.from(root.children)][{index}] : null;
    return el ? getComputedStyle(el).color : null;
}})()
"#
    )
}

/// Every image and inline svg in document order, then every element painting
/// a background image. Ties in the logo ranking keep this order.
pub const VISUAL_ELEMENTS: &str = r#"
(() => {
    const LANDMARK_NAMES = ['nav', 'navigation', 'header'];

    const isLandmark = (el) => {
        const tag = el.tagName.toLowerCase();
        return tag === 'nav'
            || tag === 'header'
            || LANDMARK_NAMES.includes(el.id)
            || LANDMARK_NAMES.some((name) => el.classList.contains(name));
    };

    const inLandmark = (el) => {
        for (let p = el.parentElement; p; p = p.parentElement) {
            if (isLandmark(p)) return true;
        }
        return false;
    };

    const inControl = (el) => {
        const parent = el.parentElement;
        return !!(parent && parent.closest('button, [role="button"]'));
    };

    const resolve = (value) => {
        if (!value || value === 'none') return null;
        if (value.startsWith('data:')) return value;
        try {
            return new URL(value, document.baseURI).href;
        } catch (e) {
            return null;
        }
    };

    const backgroundUrl = (style) => {
        const match = /url\(["']?([^()"']+)["']?\)/.exec(style.backgroundImage);
        return match ? match[1] : null;
    };

    const hasBackgroundImage = (el) => {
        const bg = getComputedStyle(el).backgroundImage;
        return bg.length > 0 && bg !== 'none';
    };

    const common = (el) => {
        const rect = el.getBoundingClientRect();
        const cls = typeof el.className === 'string'
            ? el.className
            : (el.getAttribute('class') || '');
        return {
            tag: el.tagName.toLowerCase(),
            id: el.id || null,
            className: cls || null,
            alt: el.getAttribute('alt'),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            inNavigation: inLandmark(el),
            inInteractiveControl: inControl(el),
        };
    };

    const bakeSvg = (el) => {
        const style = getComputedStyle(el);
        const clone = el.cloneNode(true);
        clone.style.color = style.color;
        clone.style.fill = style.fill;
        return clone.outerHTML;
    };

    const out = [];
    for (const el of document.querySelectorAll('img, svg')) {
        if (el.tagName.toLowerCase() === 'img') {
            out.push(Object.assign(common(el), {
                kind: 'image',
                src: resolve(el.currentSrc || el.getAttribute('src')),
                naturalWidth: el.naturalWidth,
                naturalHeight: el.naturalHeight,
            }));
        } else {
            if (el.parentElement && el.parentElement.closest('svg')) continue;
            out.push(Object.assign(common(el), {
                kind: 'vector',
                rawSvg: bakeSvg(el),
            }));
        }
    }
    for (const el of document.querySelectorAll('body *')) {
        const tag = el.tagName.toLowerCase();
        if (tag === 'img' || tag === 'svg' || el.closest('svg')) continue;
        if (!hasBackgroundImage(el)) continue;
        out.push(Object.assign(common(el), {
            kind: 'backgroundImage',
            src: resolve(backgroundUrl(getComputedStyle(el))),
        }));
    }
    return JSON.stringify(out);
})()
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_color_reads_region_color_without_touching_dom() {
        let script = text_color(2);
        assert!(script.contains("[2]"));
        assert!(script.contains("getComputedStyle(el).color"));
        assert!(!script.contains("createElement"));
        assert!(!script.contains("appendChild"));
    }

    #[test]
    fn test_images_and_svgs_collected_before_backgrounds() {
        let media = VISUAL_ELEMENTS
            .find("querySelectorAll('img, svg')")
            .unwrap();
        let backgrounds = VISUAL_ELEMENTS.find("querySelectorAll('body *')").unwrap();
        assert!(media < backgrounds);
    }
}
