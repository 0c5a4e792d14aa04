use crate::import::ImportKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvTemplate {
    pub filename: &'static str,
    pub content: &'static str,
}

const RESULTS_TEMPLATE: CsvTemplate = CsvTemplate {
    filename: "results_template.csv",
    content: "combinationKey,year,sccValue,temperature,damageCost,gdpLoss
discount_low__scenario_ssp126__damage_howard__socio_ssp1,2025,45.2,1.1,120.5,0.8
discount_low__scenario_ssp126__damage_howard__socio_ssp1,2030,52.8,1.3,145.2,1.1
",
};

const VARIABLES_TEMPLATE: CsvTemplate = CsvTemplate {
    filename: "variables_template.csv",
    content: "setName,setDescription,setOrder,paramName,paramOrder,valueLabel,value,valueOrder
Discount rate,Discount rate scenarios,1,Discount rate,1,Low,1.5,1
Discount rate,Discount rate scenarios,1,Discount rate,1,Mid,2.0,2
",
};

pub fn template_for(kind: ImportKind) -> CsvTemplate {
    match kind {
        ImportKind::Results => RESULTS_TEMPLATE,
        ImportKind::Variables => VARIABLES_TEMPLATE,
    }
}
