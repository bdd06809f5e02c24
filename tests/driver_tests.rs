use picker_select::driver::{
    appium::{
        DriverConfig, Platform, WireRequest, WireResponse, element_type_for, locator_for,
        scroll_request_for, xpath_quote,
    },
    element::{ElementPredicate, ElementType, ScreenElement, TextMatch},
    query::{ClickOutcome, ElementQuery},
    replay::ReplayScreen,
};
use picker_select::picker::{
    filter::{BlockList, CoordinateWindow},
    model::ExclusionSet,
    reconstruct::ListReconstructor,
    select::SelectionEngine,
};

fn element(element_type: ElementType, text: Option<&str>, visible: bool) -> ScreenElement {
    ScreenElement {
        id: None,
        element_type,
        text: text.map(str::to_string),
        x: 0,
        y: 0,
        width: 10,
        height: 10,
        visible,
        enabled: true,
    }
}

// =========================================================================
// Predicate matching
// =========================================================================

#[test]
fn predicate_matches_type_text_and_visibility() {
    let label = element(ElementType::StaticText, Some(" Pump 3 "), true);
    let hidden = element(ElementType::StaticText, Some("Pump 3"), false);
    let btn = element(ElementType::Button, Some("Pump 3"), true);

    let exact = ElementPredicate::static_text().with_text_exact("Pump 3");
    assert!(exact.matches(&label), "exact match ignores surrounding whitespace");
    assert!(exact.matches(&hidden));
    assert!(!exact.matches(&btn));
    assert!(!exact.clone().visible().matches(&hidden));

    let contains = ElementPredicate::any().with_text_containing("mp");
    assert!(contains.matches(&btn));
    assert!(!contains.matches(&element(ElementType::Button, None, true)));
}

#[test]
fn element_accessors() {
    let mut el = element(ElementType::Other, Some("  "), true);
    assert_eq!(el.trimmed_text(), None);
    el.x = 5;
    el.y = 9;
    assert_eq!(el.position(), (5, 9));
    assert_eq!(el.size(), (10, 10));
    assert!(el.enabled());
}

// =========================================================================
// Appium wire format
// =========================================================================

#[test]
fn ios_locator_joins_clauses() {
    let predicate = ElementPredicate::static_text()
        .with_text_exact("O'Brien")
        .visible();
    let locator = locator_for(Platform::Ios, &predicate);

    assert_eq!(locator.using, "-ios predicate string");
    assert_eq!(
        locator.value,
        "type == 'XCUIElementTypeStaticText' AND label == 'O\\'Brien' AND visible == 1"
    );
}

#[test]
fn ios_locator_without_constraints_is_truepredicate() {
    let locator = locator_for(Platform::Ios, &ElementPredicate::any());
    assert_eq!(locator.value, "TRUEPREDICATE");
}

#[test]
fn android_locator_is_xpath() {
    let locator = locator_for(
        Platform::Android,
        &ElementPredicate::buttons().with_text_containing("Pump"),
    );
    assert_eq!(locator.using, "xpath");
    assert_eq!(locator.value, "//android.widget.Button[contains(@text,'Pump')]");

    let any = locator_for(Platform::Android, &ElementPredicate::any().visible());
    assert_eq!(any.value, "//*[@displayed='true']");
}

#[test]
fn xpath_literal_handles_every_quote_mix() {
    assert_eq!(xpath_quote("Pump 3"), "'Pump 3'");
    assert_eq!(xpath_quote("O'Brien"), "\"O'Brien\"");
    assert_eq!(xpath_quote(r#"12" pipe"#), r#"'12" pipe'"#);
    assert_eq!(
        xpath_quote(r#"O'Brien 12" pipe"#),
        r#"concat('O',"'",'Brien 12" pipe')"#
    );
    assert_eq!(xpath_quote(r#"'""#), r#"concat("'",'"')"#);
}

#[test]
fn android_locator_with_both_quotes_uses_concat() {
    let locator = locator_for(
        Platform::Android,
        &ElementPredicate::static_text().with_text_exact(r#"O'Brien 12" pipe"#),
    );
    assert_eq!(
        locator.value,
        r#"//android.widget.TextView[@text=concat('O',"'",'Brien 12" pipe')]"#
    );
}

#[test]
fn class_names_map_back_to_types() {
    assert_eq!(
        element_type_for(Platform::Ios, "XCUIElementTypeButton"),
        ElementType::Button
    );
    assert_eq!(
        element_type_for(Platform::Android, "android.widget.TextView"),
        ElementType::StaticText
    );
    assert_eq!(
        element_type_for(Platform::Ios, "XCUIElementTypeCell"),
        ElementType::Other
    );
}

#[test]
fn scroll_requests_per_platform() {
    let (path, request) = scroll_request_for(Platform::Ios, &TextMatch::Exact("A1.2".into()));
    assert_eq!(path, "execute/sync");
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["script"], "mobile: scroll");
    assert_eq!(json["args"][0]["predicateString"], "label == 'A1.2'");
    assert_eq!(json["args"][0]["toVisible"], true);

    let (path, request) = scroll_request_for(Platform::Android, &TextMatch::Exact("A1.2".into()));
    assert_eq!(path, "elements");
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["using"], "-android uiautomator");
    assert!(json["value"].as_str().unwrap().contains("scrollIntoView(new UiSelector().text(\"A1.2\"))"));
}

#[test]
fn new_session_fills_platform_defaults() {
    let mut caps = serde_json::Map::new();
    caps.insert("appium:udid".into(), serde_json::json!("emulator-5554"));
    let json = serde_json::to_value(WireRequest::new_session(Platform::Android, &caps)).unwrap();

    let always = &json["capabilities"]["alwaysMatch"];
    assert_eq!(always["platformName"], "Android");
    assert_eq!(always["appium:automationName"], "UiAutomator2");
    assert_eq!(always["appium:udid"], "emulator-5554");
}

#[test]
fn empty_request_serializes_to_empty_object() {
    assert_eq!(serde_json::to_string(&WireRequest::Empty {}).unwrap(), "{}");
}

#[test]
fn wire_response_exposes_error_code() {
    let ok: WireResponse = serde_json::from_str(r#"{"value": null}"#).unwrap();
    assert_eq!(ok.error(), None);

    let err: WireResponse = serde_json::from_str(
        r#"{"value": {"error": "element not interactable", "message": "off screen"}}"#,
    )
    .unwrap();
    assert_eq!(err.error(), Some("element not interactable"));
    assert_eq!(err.message(), "off screen");
}

#[test]
fn driver_config_defaults_from_empty_yaml() {
    let config: DriverConfig = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config.endpoint, "http://127.0.0.1:4723");
    assert_eq!(config.platform, Platform::Ios);
    assert!(config.session_id.is_none());
}

// =========================================================================
// Replay screen
// =========================================================================

#[test]
fn replay_accepts_bare_array_with_defaults() {
    let screen = ReplayScreen::from_json(r#"[{"text": "A1", "x": 1, "y": 2}]"#).unwrap();
    let el = &screen.elements()[0];
    assert_eq!(el.element_type, ElementType::Other);
    assert!(el.visible);
    assert!(el.enabled);
    assert_eq!(el.width, 0);
}

#[test]
fn replay_rejects_invalid_json() {
    assert!(ReplayScreen::from_json("{not json").is_err());
    assert!(ReplayScreen::load("/definitely/missing/snapshot.json").is_err());
}

#[test]
fn replay_hidden_element_needs_scroll_before_click() {
    let mut screen = ReplayScreen::from_json(
        r#"[{"type": "static_text", "text": "Deep row", "x": 0, "y": 2000, "visible": false}]"#,
    )
    .unwrap();
    let target = screen.elements()[0].clone();

    assert_eq!(screen.click(&target).unwrap(), ClickOutcome::NotInteractable);

    let revealed = screen
        .scroll_into_view(&ElementPredicate::static_text().with_text_exact("Deep row"))
        .unwrap()
        .unwrap();
    assert!(revealed.visible);
    assert_eq!(screen.click(&revealed).unwrap(), ClickOutcome::Clicked);
    assert_eq!(screen.scroll_count(), 1);
}

#[test]
fn replay_disabled_element_rejects_click() {
    let mut screen = ReplayScreen::from_json(
        r#"[{"type": "button", "text": "Save", "x": 0, "y": 0, "enabled": false}]"#,
    )
    .unwrap();
    let target = screen.elements()[0].clone();
    assert_eq!(screen.click(&target).unwrap(), ClickOutcome::NotInteractable);
}

#[test]
fn off_screen_sibling_is_selected_after_scroll() {
    let mut screen = ReplayScreen::from_json(
        r#"[
            {"type": "static_text", "text": "Parent", "x": 0, "y": 100},
            {"type": "static_text", "text": "Below fold", "x": 0, "y": 2000, "visible": false}
        ]"#,
    )
    .unwrap();

    let entries = ListReconstructor::new(CoordinateWindow::unbounded(), BlockList::default())
        .reconstruct(&mut screen)
        .unwrap();
    let result = SelectionEngine::with_seed(std::time::Duration::ZERO, 0)
        .select_random_sibling(&mut screen, &entries, &ExclusionSet::new())
        .unwrap();

    assert_eq!(result.label(), Some("Below fold"));
    assert_eq!(screen.scroll_count(), 1);
    assert_eq!(screen.clicks().len(), 1);
}
