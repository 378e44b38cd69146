use labstore::measurement_record;

measurement_record! {
    pub struct BloodSample in "blood" keyed by date {
        cholesterol: "mg/dl",
        triglyceride: "mg/dl",
        protein: "mg/dl",
        leuko: "mg/nl",
        erythro: "/pl",
        haemo: "g/dl",
        gluc: "mg/dl",
        uric_acid: "mg/dl",
        bili: "mg/dl",
        phosphate: "U/l",
        gamma_gt: "U/l",
        got: "U/l",
        gpt: "U/l",
        ldh: "U/l",
        creatinine: "mg/dl",
        urea: "mg/dl",
        sodium: "mmol/l",
        potassium: "mmol/l",
        calcium: "mmol/l",
        iron: "mg/dl",
        hematocrite: "vol%",
        mcv: "ftl",
        mch: "pg",
        mchc: "g/l",
        thrombo: "/nl",
        lipase: "U/l",
        tsh: "mU/l",
        transferrin: "mg/dl",
        ebv_igg: "U/ml",
        ebv_igm: "U/ml",
        tpo_ab: "U/ml",
        t3: "ng/l",
        t4: "ng/dl",
        b12: "pg/ml",
        crp: "mg/dl",
        lyme_igg: "AU/ml",
        lyme_igm: "AU/ml",
        anti_ebv: "U/ml",
        vit_d: "µg/l",
    }
}

impl BloodSample {
    /// Measurements present in this sample, in table order.
    pub fn present(&self) -> Vec<(&'static str, f64)> {
        Self::UNITS
            .iter()
            .filter_map(|(column, _)| self.measurement(column).flatten().map(|value| (*column, value)))
            .collect()
    }
}
