//! Числовые коды событий журнала.
//!
//! Коды попадают в поле `code` каждого события `tracing` и используются
//! алертингом по логам, поэтому значения менять нельзя.

/// Запрос данных у хоста без SNMP сессии.
pub const NO_SESSION: u32 = 1001;
/// Таймаут GETBULK обхода, переход на GETNEXT.
pub const BULK_WALK_TIMEOUT: u32 = 1011;
/// OID в неверном формате.
pub const INVALID_OID: u32 = 1057;
/// Начало опроса хоста.
pub const QUERYING_HOST: u32 = 1078;
/// Хост недоступен, отключен или не подошли учетные данные.
pub const UNCONTACTABLE_HOST: u32 = 1081;
/// Сбой сборки CISCO-PROCESS-MIB.
pub const CISCO_PROCESS_FAULT: u32 = 1095;
/// Обход остановлен по лимиту строк.
pub const WALK_LIMIT: u32 = 1214;
/// Неизвестный протокол аутентификации или шифрования.
pub const UNKNOWN_PROTOCOL: u32 = 1218;
/// Сбой сборки LLDP-MIB.
pub const LLDP_FAULT: u32 = 1301;
/// Проверка поддержки MIB завершилась неожиданной ошибкой.
pub const SUPPORT_CHECK_FAILED: u32 = 1305;
/// Сбой сборки JUNIPER-MIB.
pub const JUNIPER_PROCESS_FAULT: u32 = 1316;
pub const CISCO_CPU: u32 = 1317;
pub const CISCO_MEMORY_USED: u32 = 1318;
pub const CISCO_MEMORY_FREE: u32 = 1319;
/// Сбой сборки остальных вариантов (SNMPv2, ENTITY, VTP, Q-BRIDGE).
pub const SYSTEM_FAULT: u32 = 1320;
pub const JUNIPER_CPU: u32 = 1321;
pub const JUNIPER_MEMORY_USED: u32 = 1322;
pub const JUNIPER_MEMORY_FREE: u32 = 1323;
/// Ошибка получения значения в общих MIB.
pub const FACT_FAILED: u32 = 1324;
/// Вариант MIB упал и исключен из документа.
pub const VARIANT_FAILED: u32 = 1417;
/// Истек срок опроса хоста.
pub const POLL_DEADLINE: u32 = 1418;
