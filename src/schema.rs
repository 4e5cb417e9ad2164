// Diesel table definitions for the monitoring schema.
//
// The authoritative DDL (CHECK constraints, cascades, views) lives in
// `db::Database::init_schema`. These declarations only describe column
// shapes so Diesel can type-check queries against them.

diesel::table! {
    centros (centro_id) {
        centro_id -> Integer,
        codigo_centro -> Text,
        nombre_centro -> Text,
        categoria -> Nullable<Integer>,
        region -> Nullable<Text>,
        utm_este -> Nullable<Integer>,
        utm_norte -> Nullable<Integer>,
        es_censurado -> Integer,
        fecha_registro -> Text,
    }
}

diesel::table! {
    ordenes_trabajo (ot_id) {
        ot_id -> Integer,
        codigo_ot -> Text,
        centro_id -> Nullable<Integer>,
        tipo_informe -> Text,
        tipo_monitoreo -> Text,
        fecha_muestreo -> Nullable<Text>,
        condicion_centro -> Text,
        numero_incumplimientos -> Integer,
        requiere_revision -> Integer,
        archivo_pdf_original -> Nullable<Text>,
        fecha_procesamiento -> Text,
    }
}

diesel::table! {
    sedimento_estaciones (estacion_id) {
        estacion_id -> Integer,
        ot_id -> Integer,
        codigo_estacion -> Text,
        utm_este -> Nullable<Integer>,
        utm_norte -> Nullable<Integer>,
        profundidad_m -> Nullable<Double>,
    }
}

diesel::table! {
    sedimento_materia_organica (muestra_id) {
        muestra_id -> Integer,
        estacion_id -> Integer,
        codigo_muestra -> Nullable<Text>,
        replica -> Integer,
        peso_muestra_g -> Nullable<Double>,
        mot_porcentaje -> Nullable<Double>,
        promedio_estacion -> Nullable<Double>,
        cumple_limite_infa -> Nullable<Integer>,
        cumple_limite_post -> Nullable<Integer>,
    }
}

diesel::table! {
    sedimento_ph_redox (muestra_id) {
        muestra_id -> Integer,
        estacion_id -> Integer,
        codigo_muestra -> Nullable<Text>,
        replica -> Integer,
        ph -> Nullable<Double>,
        promedio_ph -> Nullable<Double>,
        potencial_redox_mv -> Nullable<Double>,
        promedio_redox -> Nullable<Double>,
        temperatura_c -> Nullable<Double>,
        cumple_ph -> Nullable<Integer>,
        cumple_redox -> Nullable<Integer>,
        cumple_conjunto -> Nullable<Integer>,
    }
}

diesel::table! {
    oxigeno_perfiles (perfil_id) {
        perfil_id -> Integer,
        ot_id -> Integer,
        codigo_perfil -> Text,
        profundidad_maxima_m -> Nullable<Double>,
        utm_este -> Nullable<Integer>,
        utm_norte -> Nullable<Integer>,
    }
}

diesel::table! {
    oxigeno_mediciones (medicion_id) {
        medicion_id -> Integer,
        perfil_id -> Integer,
        numero_capa -> Integer,
        profundidad_m -> Nullable<Double>,
        es_capa_z1 -> Integer,
        oxigeno_mg_l -> Nullable<Double>,
        temperatura_c -> Nullable<Double>,
        salinidad_psu -> Nullable<Double>,
        saturacion_pct -> Nullable<Double>,
        cumple_limite -> Nullable<Integer>,
    }
}

diesel::table! {
    registro_visual_transectas (transecta_id) {
        transecta_id -> Integer,
        ot_id -> Integer,
        codigo_transecta -> Text,
        fecha_filmacion -> Nullable<Text>,
        hora_inicio -> Nullable<Text>,
        hora_fin -> Nullable<Text>,
        sustrato -> Nullable<Text>,
        presencia_matas -> Nullable<Integer>,
        presencia_burbujas -> Nullable<Integer>,
        observaciones -> Nullable<Text>,
    }
}

diesel::table! {
    registro_visual_abundancia (observacion_id) {
        observacion_id -> Integer,
        transecta_id -> Integer,
        grupo_taxonomico -> Nullable<Text>,
        especie -> Nullable<Text>,
        codigo_abundancia -> Text,
        conteo_min -> Nullable<Integer>,
        conteo_max -> Nullable<Integer>,
    }
}

diesel::table! {
    auditoria_extraccion (auditoria_id) {
        auditoria_id -> Integer,
        ot_id -> Integer,
        tabla_afectada -> Text,
        registros_esperados -> Integer,
        registros_extraidos -> Integer,
        porcentaje_completitud -> Nullable<Double>,
        valores_fuera_rango -> Integer,
        duracion_segundos -> Nullable<Double>,
        requiere_revision -> Integer,
        fecha_proceso -> Text,
    }
}

diesel::table! {
    log_procesamiento (log_id) {
        log_id -> Integer,
        timestamp -> Text,
        nivel -> Text,
        archivo_origen -> Nullable<Text>,
        fase -> Nullable<Text>,
        mensaje -> Text,
    }
}

diesel::table! {
    configuracion_defaults (clave) {
        clave -> Text,
        valor -> Text,
        descripcion -> Nullable<Text>,
    }
}

diesel::joinable!(ordenes_trabajo -> centros (centro_id));
diesel::joinable!(sedimento_estaciones -> ordenes_trabajo (ot_id));
diesel::joinable!(sedimento_materia_organica -> sedimento_estaciones (estacion_id));
diesel::joinable!(sedimento_ph_redox -> sedimento_estaciones (estacion_id));
diesel::joinable!(oxigeno_perfiles -> ordenes_trabajo (ot_id));
diesel::joinable!(oxigeno_mediciones -> oxigeno_perfiles (perfil_id));
diesel::joinable!(registro_visual_transectas -> ordenes_trabajo (ot_id));
diesel::joinable!(registro_visual_abundancia -> registro_visual_transectas (transecta_id));
diesel::joinable!(auditoria_extraccion -> ordenes_trabajo (ot_id));

diesel::allow_tables_to_appear_in_same_query!(
    centros,
    ordenes_trabajo,
    sedimento_estaciones,
    sedimento_materia_organica,
    sedimento_ph_redox,
    oxigeno_perfiles,
    oxigeno_mediciones,
    registro_visual_transectas,
    registro_visual_abundancia,
    auditoria_extraccion,
    log_procesamiento,
    configuracion_defaults,
);
