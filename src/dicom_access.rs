use dicom::core::Tag;
use dicom::dictionary_std::StandardDataDictionary;
use dicom::object::{DefaultDicomObject, InMemDicomObject};

/// Small helper trait to pull typed values from different DICOM object shapes.
pub trait ElementAccess {
    fn inner(&self) -> &InMemDicomObject<StandardDataDictionary>;

    fn element_str(&self, tag: Tag) -> Option<String> {
        self.inner()
            .element(tag)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn element_int(&self, tag: Tag) -> Option<i64> {
        self.inner()
            .element(tag)
            .ok()
            .and_then(|e| e.to_int::<i64>().ok())
    }

    fn element_f64(&self, tag: Tag) -> Option<f64> {
        self.inner()
            .element(tag)
            .ok()
            .and_then(|e| e.to_float64().ok())
    }

    fn element_multi_f64(&self, tag: Tag) -> Option<Vec<f64>> {
        self.inner()
            .element(tag)
            .ok()
            .and_then(|e| e.to_multi_float64().ok())
    }

    fn has_element(&self, tag: Tag) -> bool {
        self.inner().element(tag).is_ok()
    }
}

impl ElementAccess for DefaultDicomObject {
    fn inner(&self) -> &InMemDicomObject<StandardDataDictionary> {
        self
    }
}

impl ElementAccess for InMemDicomObject<StandardDataDictionary> {
    fn inner(&self) -> &InMemDicomObject<StandardDataDictionary> {
        self
    }
}
