//! Browser-side search functions used by custom locators.
//!
//! Each script is the body of a function invoked with the finder's own
//! arguments followed by the scope element (or null for the whole
//! document). Thrown non-Error values are rethrown as Errors so the remote
//! end reports a message.

pub const BUTTON_TEXT: &str = r#"try { return (function(searchText, using) {
  using = using || document;
  var elements = using.querySelectorAll('button, input[type="button"], input[type="submit"]');
  var matches = [];
  for (var i = 0; i < elements.length; ++i) {
    var element = elements[i];
    var elementText = element.tagName.toLowerCase() == 'button'
        ? (element.textContent || element.innerText || '')
        : element.value;
    if (elementText.trim() === searchText) {
      matches.push(element);
    }
  }
  return matches;
}).apply(this, arguments); }
catch (e) { throw (e instanceof Error) ? e : new Error(e); }"#;

pub const PARTIAL_BUTTON_TEXT: &str = r#"try { return (function(searchText, using) {
  using = using || document;
  var elements = using.querySelectorAll('button, input[type="button"], input[type="submit"]');
  var matches = [];
  for (var i = 0; i < elements.length; ++i) {
    var element = elements[i];
    var elementText = element.tagName.toLowerCase() == 'button'
        ? (element.textContent || element.innerText || '')
        : element.value;
    if (elementText.indexOf(searchText) > -1) {
      matches.push(element);
    }
  }
  return matches;
}).apply(this, arguments); }
catch (e) { throw (e instanceof Error) ? e : new Error(e); }"#;

/// `searchText` is either a plain substring or `__REGEXP__/pattern/flags`.
pub const CSS_CONTAINING_TEXT: &str = r#"try { return (function(cssSelector, searchText, using) {
  using = using || document;
  if (searchText.indexOf('__REGEXP__') === 0) {
    var match = searchText.split('__REGEXP__')[1].match(/\/(.*)\/(.*)?/);
    searchText = new RegExp(match[1], match[2] || '');
  }
  var elements = using.querySelectorAll(cssSelector);
  var matches = [];
  for (var i = 0; i < elements.length; ++i) {
    var element = elements[i];
    var elementText = element.textContent || element.innerText || '';
    var elementMatches = searchText instanceof RegExp
        ? searchText.test(elementText)
        : elementText.indexOf(searchText) > -1;
    if (elementMatches) {
      matches.push(element);
    }
  }
  return matches;
}).apply(this, arguments); }
catch (e) { throw (e instanceof Error) ? e : new Error(e); }"#;

/// Innermost elements whose trimmed text equals `searchText`, plus form
/// controls whose value or placeholder does.
pub const EXACT_TEXT: &str = r#"try { return (function(searchText, using) {
  using = using || document;
  var elements = using.querySelectorAll('*');
  var matches = [];
  for (var i = 0; i < elements.length; ++i) {
    var element = elements[i];
    var tag = element.tagName.toLowerCase();
    if (tag === 'script' || tag === 'style') {
      continue;
    }
    if (tag === 'input' || tag === 'textarea') {
      if ((element.value || '').trim() === searchText ||
          (element.getAttribute('placeholder') || '').trim() === searchText) {
        matches.push(element);
      }
      continue;
    }
    var text = (element.textContent || '').trim();
    if (text !== searchText) {
      continue;
    }
    var innermost = true;
    for (var j = 0; j < element.children.length; ++j) {
      if ((element.children[j].textContent || '').trim() === searchText) {
        innermost = false;
        break;
      }
    }
    if (innermost) {
      matches.push(element);
    }
  }
  return matches;
}).apply(this, arguments); }
catch (e) { throw (e instanceof Error) ? e : new Error(e); }"#;

pub const REGEXP_MARKER: &str = "__REGEXP__";

/// Serializes a pattern the way `CSS_CONTAINING_TEXT` expects it.
pub fn serialize_regexp(pattern: &str, flags: &str) -> String {
    format!("{}/{}/{}", REGEXP_MARKER, pattern, flags)
}

/// Inverse of `serialize_regexp`.
pub fn parse_regexp(search_text: &str) -> Option<(&str, &str)> {
    let body = search_text.strip_prefix(REGEXP_MARKER)?.strip_prefix('/')?;
    let end = body.rfind('/')?;
    Some((&body[..end], &body[end + 1..]))
}
