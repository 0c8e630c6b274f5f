use aihcore::{
    summary::{self, Metric},
    AihError, Pipeline, PipelineConfig, PipelineOutcome, Source, TableRole,
};
use anyhow::Result;
use std::{fs, sync::Arc};

const ADMISSIONS: &str = "\
ano_aih;mes_aih;codigo_municipio;vl_total;qtd_total;vl_02;vl_03;qtd_01;uf;carater;sexo
2022;5;350010111;120.5;2;100;20.5;2;SP;eletivo;F
2022;6;350020222;80;1;50;30;1;SP;urgencia;M
2023;1;330455000;300;5;200;100;5;RJ;urgencia;F
2023;2;330455999;60;1;10;50;1;RJ;eletivo;M
2023;2;;15;1;5;10;1;MG;eletivo;F
";

const MUNICIPIOS: &str = "\
codigo_ibge,nome_municipio,latitude,longitude,uf
350010,Adamantina,-21.68,-51.07,SP
3500204,Adolfo,-21.23,-49.64,SP
3304557,Rio de Janeiro,-22.90,-43.17,RJ
";

#[test]
fn files_on_disk_end_to_end() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let adm_path = dir.path().join("dados_corrigidos.csv");
    let ref_path = dir.path().join("municipios.csv");

    let yaml = format!(
        "admissions:\n  path: {}\n  separator: ';'\nreference:\n  path: {}\n  separator: ','\nscale_ceiling: 1000\n",
        adm_path.display(),
        ref_path.display()
    );
    let config = PipelineConfig::from_yaml_str(&yaml)?;
    let pipeline = Pipeline::new(config);

    // nothing on disk yet
    match pipeline.prepare_configured()? {
        PipelineOutcome::AwaitingInput(missing) => {
            assert_eq!(missing.len(), 2);
            assert_eq!(missing[0].role, TableRole::Admissions);
            assert_eq!(missing[1].path, ref_path);
        }
        PipelineOutcome::Ready(_) => panic!("inputs should be missing"),
    }

    fs::write(&adm_path, ADMISSIONS)?;
    fs::write(&ref_path, MUNICIPIOS)?;
    let ds = pipeline
        .prepare_configured()?
        .ready()
        .expect("both tables present");

    assert_eq!(ds.num_rows(), 5);
    // `uf` exists on both sides
    assert!(ds.column("uf_x").is_some());
    assert!(ds.column("uf_y").is_some());

    let value = &summary::describe(&ds, &["value_scaled"])?[0];
    assert_eq!(value.max, Some(1000.0));
    assert_eq!(value.count, 5);

    // the blank-code row has no coordinates
    let points = summary::map_points(&ds, Metric::Value)?;
    assert_eq!(points.len(), 4);
    assert_eq!(points[2].municipality.as_deref(), Some("Rio de Janeiro"));

    let m = pipeline.associate(&ds, &["uf_x", "carater", "sexo", "nome_municipio"])?;
    for a in m.columns() {
        assert_eq!(m.get(a, a), Some(1.0));
        for b in m.columns() {
            let v = m.get(a, b).unwrap();
            assert_eq!(Some(v), m.get(b, a));
            assert!((0.0..=1.0).contains(&v));
        }
    }

    let again = pipeline.associate(&ds, &["sexo", "nome_municipio", "carater", "uf_x"])?;
    assert!(Arc::ptr_eq(&m, &again));
    assert_eq!(pipeline.cache_stats().matrices.misses, 1);
    Ok(())
}

#[test]
fn stream_sources_and_year_filter() -> Result<()> {
    let pipeline = Pipeline::new(PipelineConfig::default());
    let ds = pipeline
        .prepare(
            Source::bytes("upload-aih.csv", ADMISSIONS),
            Source::bytes("upload-municipios.csv", MUNICIPIOS),
        )?
        .ready()
        .expect("stream sources are never missing");

    assert_eq!(summary::available_years(&ds)?, vec![2022, 2023]);
    let recent = summary::filter_years(&ds, &[2023])?;
    assert_eq!(recent.num_rows(), 3);

    let series = summary::procedure_totals(&recent, Metric::Value)?;
    assert_eq!(series[0], ("vl_02".to_string(), 215.0));
    assert_eq!(series[1], ("vl_03".to_string(), 160.0));

    let months = summary::monthly_totals(&recent, Metric::Count)?;
    assert_eq!(months.len(), 2);
    assert_eq!(months[1].total, 2.0);
    Ok(())
}

#[test]
fn duplicate_reference_codes_are_rejected() {
    let pipeline = Pipeline::new(PipelineConfig::default());
    let err = pipeline
        .prepare(
            Source::bytes("aih.csv", ADMISSIONS),
            Source::bytes(
                "municipios.csv",
                "codigo_ibge,nome_municipio\n350010,A\n3500105,B\n",
            ),
        )
        .unwrap_err();
    assert!(matches!(err, AihError::MergeCardinalityViolation { ref key, occurrences: 2 } if key == "350010"));
}
