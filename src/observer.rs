use serde::{Serialize, Deserialize};

/// Geographic location of the mount. East and North are positive.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Observer {
    pub latitude:  f64, // in degrees
    pub longitude: f64, // in degrees
}

#[test]
fn test_observer_serde() {
    let observer = Observer { latitude: -31.08, longitude: 150.944799 };
    let text = serde_json::to_string(&observer).unwrap();
    let restored: Observer = serde_json::from_str(&text).unwrap();
    assert!(restored.latitude == observer.latitude);
    assert!(restored.longitude == observer.longitude);

    // missing fields fall back to defaults
    let restored: Observer = serde_json::from_str("{}").unwrap();
    assert!(restored.latitude == 0.0);
    assert!(restored.longitude == 0.0);
}
